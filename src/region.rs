use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::elevation::decode_height;
use crate::error::FetchError;
use crate::grid::Grid;

/// Active sub-area of a raster, in pixels. `right` and `bottom` are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl CropRect {
    pub fn width(&self) -> usize {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> usize {
        self.bottom.saturating_sub(self.top)
    }
}

/// Elevation raster plus the crop that covers the viewport.
#[derive(Clone, Debug)]
pub struct Region {
    raster: Arc<Grid<[u8; 4]>>,
    crop: CropRect,
}

impl Region {
    pub fn new(raster: Arc<Grid<[u8; 4]>>, crop: CropRect) -> Result<Self, FetchError> {
        if crop.width() == 0 || crop.height() == 0 {
            return Err(FetchError::InvalidRegion(format!("empty crop {crop:?}")));
        }
        if crop.right > raster.w || crop.bottom > raster.h {
            return Err(FetchError::InvalidRegion(format!(
                "crop {crop:?} outside {}x{} raster",
                raster.w, raster.h
            )));
        }
        Ok(Self { raster, crop })
    }

    /// Region covering the whole raster.
    pub fn full(raster: Grid<[u8; 4]>) -> Result<Self, FetchError> {
        let crop = CropRect {
            left: 0,
            top: 0,
            right: raster.w,
            bottom: raster.h,
        };
        Self::new(Arc::new(raster), crop)
    }

    pub fn raster(&self) -> &Grid<[u8; 4]> {
        &self.raster
    }

    pub fn crop(&self) -> CropRect {
        self.crop
    }
}

/// Height extremes of a region. Rows are raw raster rows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extremes {
    pub min_height: f64,
    pub max_height: f64,
    pub min_row: usize,
    pub max_row: usize,
}

impl Extremes {
    const EMPTY: Self = Self {
        min_height: f64::INFINITY,
        max_height: f64::NEG_INFINITY,
        min_row: 0,
        max_row: 0,
    };

    /// Merge with extremes of a later part of the scan; earlier wins ties.
    fn merge(self, later: Self) -> Self {
        let (min_height, min_row) = if later.min_height < self.min_height {
            (later.min_height, later.min_row)
        } else {
            (self.min_height, self.min_row)
        };
        let (max_height, max_row) = if later.max_height > self.max_height {
            (later.max_height, later.max_row)
        } else {
            (self.max_height, self.max_row)
        };
        Self {
            min_height,
            max_height,
            min_row,
            max_row,
        }
    }

    pub fn range(&self) -> f64 {
        self.max_height - self.min_height
    }
}

/// Which rows to sample: `start`, `start + step`, ... while `< stop`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowPlan {
    pub start: usize,
    pub step: usize,
    pub stop: usize,
}

impl RowPlan {
    pub fn rows(&self) -> impl Iterator<Item = usize> {
        (self.start..self.stop).step_by(self.step.max(1))
    }
}

/// Samples heights inside a region's crop rectangle.
pub struct RegionIterator<'a> {
    raster: &'a Grid<[u8; 4]>,
    crop: CropRect,
    ocean_level: f64,
}

impl<'a> RegionIterator<'a> {
    pub fn new(region: &'a Region, ocean_level: f64) -> Self {
        Self {
            raster: &region.raster,
            crop: region.crop,
            ocean_level,
        }
    }

    pub fn ocean_level(&self) -> f64 {
        self.ocean_level
    }

    /// Height at normalized `(row, col)` in [0, 1) x [0, 1) of the crop.
    /// Rounding at the far edge is pulled back onto the last crop pixel.
    #[inline]
    pub fn height_at(&self, row: f64, col: f64) -> f64 {
        let c = self.crop;
        let x = (c.left as f64 + col * c.width() as f64).round() as usize;
        let y = (c.top as f64 + row * c.height() as f64).round() as usize;
        let x = x.clamp(c.left, c.right - 1);
        let y = y.clamp(c.top, c.bottom - 1);
        decode_height(self.raster.get(x, y), self.ocean_level)
    }

    /// Full scan of the crop. Rows run in parallel and are reduced in scan
    /// order, so ties always resolve to the first extreme in row-major order.
    pub fn min_max_height(&self) -> Extremes {
        let c = self.crop;
        let ocean = self.ocean_level;
        (c.top..c.bottom)
            .into_par_iter()
            .map(|y| {
                let mut ext = Extremes::EMPTY;
                for &px in &self.raster.row(y)[c.left..c.right] {
                    let h = decode_height(px, ocean);
                    if h < ext.min_height {
                        ext.min_height = h;
                        ext.min_row = y;
                    }
                    if h > ext.max_height {
                        ext.max_height = h;
                        ext.max_row = y;
                    }
                }
                ext
            })
            .reduce(|| Extremes::EMPTY, Extremes::merge)
    }
}

/// Row sampling plan for `row_count` rows over `res_height` canvas rows.
///
/// The anchor row always lies on the grid: `start` is the anchor walked back
/// by whole steps for as long as `start - step` stays positive. A zero row
/// count is treated as one row, so `step` is never zero.
pub fn iterator_settings(row_count: usize, res_height: usize, anchor: usize) -> RowPlan {
    let step = (res_height as f64 / row_count.max(1) as f64).round().max(1.0) as usize;
    let start = if anchor > step {
        match anchor % step {
            0 => step,
            r => r,
        }
    } else {
        anchor
    };
    RowPlan {
        start,
        step,
        stop: res_height,
    }
}
