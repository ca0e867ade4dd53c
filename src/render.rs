use crate::config::{Color, RenderConfig};
use crate::smooth::smooth;
use crate::surface::{Point, Surface};

/// Runs shorter than this are too thin to be worth a path.
pub const MIN_RUN_POINTS: usize = 3;

/// Smoothed runs taller than this many pixels get a fill under the line.
pub const FILL_THRESHOLD: f32 = 1.0;

/// Colors and geometry for one render pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineStyle {
    pub stroke: Color,
    pub fill: Color,
    pub background: Color,
    pub width: f32,
    pub opacity: f32,
    pub smooth_window: usize,
}

impl From<&RenderConfig> for LineStyle {
    fn from(cfg: &RenderConfig) -> Self {
        Self {
            stroke: cfg.line_color,
            fill: cfg.line_background,
            background: cfg.background_color,
            width: cfg.line_width,
            opacity: cfg.opacity,
            smooth_window: cfg.smooth_steps,
        }
    }
}

/// Wipe the surface with the background color and apply the pass opacity.
pub fn clear_scene(surface: &mut dyn Surface, style: &LineStyle) {
    surface.clear(style.background);
    surface.set_opacity(style.opacity);
}

/// Draw one above-ocean run. Returns false when the run is too short to draw.
///
/// The smoothed line is filled down to its own lowest point (largest y) so
/// rows further back are hidden behind it, then stroked on top.
pub fn draw_polyline(surface: &mut dyn Surface, points: &[Point], style: &LineStyle) -> bool {
    if points.len() < MIN_RUN_POINTS {
        return false;
    }

    let smoothed = smooth(points, style.smooth_window);
    let line = &smoothed.points;

    if smoothed.max - smoothed.min > FILL_THRESHOLD {
        let first = line[0];
        let last = line[line.len() - 1];
        let mut outline = Vec::with_capacity(line.len() + 2);
        outline.extend_from_slice(line);
        outline.push(Point::new(last.x, smoothed.max));
        outline.push(Point::new(first.x, smoothed.max));
        surface.fill_polygon(&outline, style.fill);
    }

    surface.stroke_polyline(line, style.stroke, style.width);
    true
}
