use std::error::Error;
use std::path::PathBuf;

use ridgeline::{ImageSource, PixmapSurface, RenderError, RenderOutcome, Renderer, Settings, Viewport};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = std::env::args().collect();

    let input: PathBuf = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("heightmap.png"));
    let width: u32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(1920);
    let height: u32 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(1080);
    let out: PathBuf = args
        .get(4)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("ridgeline.png"));

    let settings = Settings::default();
    info!(
        input = %input.display(),
        width,
        height,
        density = %settings.line_density,
        "rendering"
    );

    let renderer = Renderer::new(ImageSource::open(&input)?);
    let mut surface =
        PixmapSurface::new(width, height).ok_or(RenderError::Surface { width, height })?;

    match renderer
        .render(&Viewport::WORLD, &settings, &mut surface)
        .await?
    {
        RenderOutcome::Completed(stats) => {
            eprintln!("\nTimings:");
            for t in &stats.timings {
                eprintln!("  {:20} {:8.1} ms", t.name, t.ms);
            }
            eprintln!("  {} rows, {} polylines", stats.rows, stats.polylines);
        }
        RenderOutcome::Cancelled => warn!("render cancelled"),
    }

    std::fs::write(&out, surface.encode_png()?)?;
    info!(path = %out.display(), "saved");
    Ok(())
}
