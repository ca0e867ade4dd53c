//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use ridgeline::grid::Grid;
use ridgeline::{
    Color, FetchError, Point, ProgressSink, Region, RegionRequest, RegionSource, Settings, Surface,
};

/// One call made against a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    Clear(Color),
    Opacity(f32),
    Fill(Vec<Point>),
    Stroke(Vec<Point>),
}

/// Surface that records calls instead of rasterizing.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    pub width: u32,
    pub height: u32,
    pub calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
        }
    }

    pub fn strokes(&self) -> Vec<&Vec<Point>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Stroke(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn fills(&self) -> Vec<&Vec<Point>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Fill(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    /// Fill and stroke calls; clear and opacity are not drawing.
    pub fn draw_count(&self) -> usize {
        self.strokes().len() + self.fills().len()
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self, background: Color) {
        self.calls.push(DrawCall::Clear(background));
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.calls.push(DrawCall::Opacity(opacity));
    }

    fn fill_polygon(&mut self, points: &[Point], _color: Color) {
        self.calls.push(DrawCall::Fill(points.to_vec()));
    }

    fn stroke_polyline(&mut self, points: &[Point], _color: Color, _width: f32) {
        self.calls.push(DrawCall::Stroke(points.to_vec()));
    }
}

/// Region over a gray raster given as rows of red-channel bytes.
pub fn gray_region(rows: &[&[u8]]) -> Region {
    let h = rows.len();
    let w = rows[0].len();
    let mut grid = Grid::new(w, h);
    for (y, row) in rows.iter().enumerate() {
        for (x, &v) in row.iter().enumerate() {
            grid.set(x, y, [v, v, v, 255]);
        }
    }
    Region::full(grid).unwrap()
}

/// Smooth hill: bright in the middle, darker towards the edges.
pub fn hill_region(w: usize, h: usize) -> Region {
    let mut grid = Grid::new(w, h);
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    for y in 0..h {
        for x in 0..w {
            let d = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
            let v = (220.0 - d * 4.0).clamp(60.0, 220.0) as u8;
            grid.set(x, y, [v, v, v, 255]);
        }
    }
    Region::full(grid).unwrap()
}

pub fn settings(density: &str, smooth: &str) -> Settings {
    Settings {
        line_density: density.into(),
        smooth_steps: smooth.into(),
        height_scale: "20".into(),
        ..Settings::default()
    }
}

/// Source whose fetch blocks until `gate` is notified.
pub struct GatedSource {
    pub region: Region,
    pub gate: Arc<Notify>,
}

#[async_trait]
impl RegionSource for GatedSource {
    async fn fetch_region(
        &self,
        _request: &RegionRequest,
        progress: &ProgressSink,
    ) -> Result<Region, FetchError> {
        progress.set_message("waiting for tiles");
        self.gate.notified().await;
        Ok(self.region.clone())
    }
}

/// Source that always fails.
pub struct FailingSource;

#[async_trait]
impl RegionSource for FailingSource {
    async fn fetch_region(
        &self,
        _request: &RegionRequest,
        _progress: &ProgressSink,
    ) -> Result<Region, FetchError> {
        Err(FetchError::Unavailable("tile server down".into()))
    }
}
