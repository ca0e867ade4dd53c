pub mod config;
pub mod elevation;
pub mod error;
pub mod grid;
pub mod progress;
pub mod region;
pub mod render;
pub mod renderer;
pub mod smooth;
pub mod source;
pub mod surface;

pub use config::{Color, RenderConfig, Settings};
pub use error::{ConfigError, FetchError, RenderError};
pub use progress::{Progress, ProgressSink};
pub use region::{CropRect, Region};
pub use renderer::{CancelToken, RenderOutcome, RenderStats, RenderTask, Renderer, Step};
pub use source::{ImageSource, LngLat, RegionRequest, RegionSource, StaticSource, Viewport};
pub use surface::{PixmapSurface, Point, Surface};

#[derive(Clone, Debug, PartialEq)]
pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}
