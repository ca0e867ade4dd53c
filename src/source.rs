//! Where elevation regions come from.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::FetchError;
use crate::grid::Grid;
use crate::progress::ProgressSink;
use crate::region::{CropRect, Region};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// Visible map area.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub north_east: LngLat,
    pub south_west: LngLat,
    pub zoom: f64,
}

impl Viewport {
    pub const WORLD: Viewport = Viewport {
        north_east: LngLat::new(180.0, 90.0),
        south_west: LngLat::new(-180.0, -90.0),
        zoom: 0.0,
    };
}

impl Default for Viewport {
    fn default() -> Self {
        Self::WORLD
    }
}

/// What the renderer asks a source for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionRequest {
    pub north_east: LngLat,
    pub south_west: LngLat,
    pub zoom: u32,
    pub height_scale: f64,
}

impl RegionRequest {
    /// Zoom is floored to a whole tile level.
    pub fn new(viewport: &Viewport, height_scale: f64) -> Self {
        Self {
            north_east: viewport.north_east,
            south_west: viewport.south_west,
            zoom: viewport.zoom.max(0.0).floor() as u32,
            height_scale,
        }
    }
}

/// Produces the elevation region covering a viewport.
/// Sources may post status text to `progress` while they work.
#[async_trait]
pub trait RegionSource: Send + Sync {
    async fn fetch_region(
        &self,
        request: &RegionRequest,
        progress: &ProgressSink,
    ) -> Result<Region, FetchError>;
}

#[async_trait]
impl<S: RegionSource + ?Sized> RegionSource for Arc<S> {
    async fn fetch_region(
        &self,
        request: &RegionRequest,
        progress: &ProgressSink,
    ) -> Result<Region, FetchError> {
        (**self).fetch_region(request, progress).await
    }
}

/// Serves the same region for every request.
#[derive(Clone, Debug)]
pub struct StaticSource {
    region: Region,
}

impl StaticSource {
    pub fn new(region: Region) -> Self {
        Self { region }
    }
}

#[async_trait]
impl RegionSource for StaticSource {
    async fn fetch_region(
        &self,
        _request: &RegionRequest,
        _progress: &ProgressSink,
    ) -> Result<Region, FetchError> {
        Ok(self.region.clone())
    }
}

/// Equirectangular world heightmap loaded from an image file.
/// Column 0 is lng -180, row 0 is lat 90.
#[derive(Clone, Debug)]
pub struct ImageSource {
    raster: Arc<Grid<[u8; 4]>>,
}

impl ImageSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FetchError> {
        let path = path.as_ref();
        let img = image::open(path)?.to_rgba8();
        let (w, h) = img.dimensions();
        info!(path = %path.display(), w, h, "loaded heightmap");
        Self::from_raster(Grid::from_rgba(w as usize, h as usize, img.as_raw()).ok_or_else(
            || FetchError::InvalidRegion(format!("{} has a truncated pixel buffer", path.display())),
        )?)
    }

    pub fn from_raster(raster: Grid<[u8; 4]>) -> Result<Self, FetchError> {
        if raster.w == 0 || raster.h == 0 {
            return Err(FetchError::InvalidRegion("empty heightmap".into()));
        }
        Ok(Self {
            raster: Arc::new(raster),
        })
    }

    /// Pixel rectangle covering the request, at least one pixel each way.
    pub fn crop_for(&self, request: &RegionRequest) -> CropRect {
        let w = self.raster.w as f64;
        let h = self.raster.h as f64;
        let west = request.south_west.lng.min(request.north_east.lng);
        let east = request.south_west.lng.max(request.north_east.lng);
        let north = request.north_east.lat.max(request.south_west.lat);
        let south = request.north_east.lat.min(request.south_west.lat);

        let to_x = |lng: f64| ((lng + 180.0) / 360.0 * w).clamp(0.0, w);
        let to_y = |lat: f64| ((90.0 - lat) / 180.0 * h).clamp(0.0, h);

        let left = (to_x(west).floor() as usize).min(self.raster.w - 1);
        let top = (to_y(north).floor() as usize).min(self.raster.h - 1);
        let right = (to_x(east).ceil() as usize).max(left + 1);
        let bottom = (to_y(south).ceil() as usize).max(top + 1);
        CropRect {
            left,
            top,
            right,
            bottom,
        }
    }
}

#[async_trait]
impl RegionSource for ImageSource {
    #[instrument(skip(self, progress), fields(zoom = request.zoom))]
    async fn fetch_region(
        &self,
        request: &RegionRequest,
        progress: &ProgressSink,
    ) -> Result<Region, FetchError> {
        progress.set_message("Loading elevation...");
        let crop = self.crop_for(request);
        debug!(?crop, "cropped heightmap");
        progress.set_message(format!("Cropped {}x{} pixels", crop.width(), crop.height()));
        Region::new(self.raster.clone(), crop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(ne: (f64, f64), sw: (f64, f64)) -> RegionRequest {
        RegionRequest::new(
            &Viewport {
                north_east: LngLat::new(ne.0, ne.1),
                south_west: LngLat::new(sw.0, sw.1),
                zoom: 3.7,
            },
            100.0,
        )
    }

    #[test]
    fn zoom_is_floored() {
        assert_eq!(request((1.0, 1.0), (0.0, 0.0)).zoom, 3);
    }

    #[test]
    fn world_request_covers_raster() {
        let src = ImageSource::from_raster(Grid::filled_gray(360, 180, 90)).unwrap();
        let crop = src.crop_for(&RegionRequest::new(&Viewport::WORLD, 1.0));
        assert_eq!(
            crop,
            CropRect {
                left: 0,
                top: 0,
                right: 360,
                bottom: 180
            }
        );
    }

    #[test]
    fn quadrant_request_crops() {
        let src = ImageSource::from_raster(Grid::filled_gray(360, 180, 90)).unwrap();
        // north-east quadrant
        let crop = src.crop_for(&request((180.0, 90.0), (0.0, 0.0)));
        assert_eq!(
            crop,
            CropRect {
                left: 180,
                top: 0,
                right: 360,
                bottom: 90
            }
        );
    }

    #[test]
    fn degenerate_request_keeps_one_pixel() {
        let src = ImageSource::from_raster(Grid::filled_gray(360, 180, 90)).unwrap();
        let crop = src.crop_for(&request((180.0, -90.0), (180.0, -90.0)));
        assert_eq!(crop.width(), 1);
        assert_eq!(crop.height(), 1);
        assert!(crop.right <= 360 && crop.bottom <= 180);
    }

    #[tokio::test]
    async fn image_source_reports_progress() {
        let src = ImageSource::from_raster(Grid::filled_gray(36, 18, 90)).unwrap();
        let sink = ProgressSink::new();
        sink.start();
        let region = src
            .fetch_region(&RegionRequest::new(&Viewport::WORLD, 1.0), &sink)
            .await
            .unwrap();
        assert_eq!(region.crop().width(), 36);
        assert_eq!(sink.current().unwrap().message, "Cropped 36x18 pixels");
    }
}
