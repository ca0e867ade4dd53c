//! Drawing surfaces.
//!
//! The renderer only ever clears, fills closed polygons and strokes open
//! polylines, so that is all a [`Surface`] has to provide. [`PixmapSurface`]
//! rasterizes with tiny-skia.

use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::config::Color;

/// A point in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Target of a render pass.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Replace every pixel with `background`.
    fn clear(&mut self, background: Color);

    /// Opacity applied to the whole surface when it is composited or exported.
    fn set_opacity(&mut self, opacity: f32);

    /// Fill the polygon through `points`; the last point connects to the first.
    fn fill_polygon(&mut self, points: &[Point], color: Color);

    /// Stroke the open polyline through `points`.
    fn stroke_polyline(&mut self, points: &[Point], color: Color, width: f32);
}

fn paint_for(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.alpha_u8());
    paint.anti_alias = true;
    paint
}

fn path_through(points: &[Point], close: bool) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

/// In-memory RGBA surface backed by a tiny-skia pixmap.
#[derive(Clone)]
pub struct PixmapSurface {
    pixmap: Pixmap,
    opacity: f32,
}

impl PixmapSurface {
    /// None for zero-sized or absurdly large canvases.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            pixmap: Pixmap::new(width, height)?,
            opacity: 1.0,
        })
    }

    /// Straight (non-premultiplied) RGBA bytes with the surface opacity
    /// folded into alpha.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            let a = (c.alpha() as f32 * self.opacity).round() as u8;
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), a]);
        }
        out
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf).write_image(
            &self.to_rgba(),
            self.width(),
            self.height(),
            image::ExtendedColorType::Rgba8,
        )?;
        Ok(buf)
    }
}

impl Surface for PixmapSurface {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn clear(&mut self, background: Color) {
        self.pixmap.fill(tiny_skia::Color::from_rgba8(
            background.r,
            background.g,
            background.b,
            background.alpha_u8(),
        ));
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color) {
        if let Some(path) = path_through(points, true) {
            self.pixmap.fill_path(
                &path,
                &paint_for(color),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    fn stroke_polyline(&mut self, points: &[Point], color: Color, width: f32) {
        let Some(path) = path_through(points, false) else {
            return;
        };
        let stroke = Stroke {
            width,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint_for(color), &stroke, Transform::identity(), None);
    }
}
