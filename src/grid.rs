/// Row-major flat grid. No per-cell objects.
/// Rasters are `Grid<[u8; 4]>`, one RGBA pixel per cell.
#[derive(Clone, Debug)]
pub struct Grid<T> {
    pub data: Vec<T>,
    pub w: usize,
    pub h: usize,
}

impl<T: Copy + Default> Grid<T> {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            data: vec![T::default(); w * h],
            w,
            h,
        }
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.w && y < self.h);
        y * self.w + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: T) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Row `y` as a slice.
    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        &self.data[y * self.w..(y + 1) * self.w]
    }
}

impl Grid<[u8; 4]> {
    /// Build a raster from tightly packed RGBA bytes.
    /// Returns None when the byte count does not match `w * h * 4`.
    pub fn from_rgba(w: usize, h: usize, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != w * h * 4 {
            return None;
        }
        let data = bytes
            .chunks_exact(4)
            .map(|px| [px[0], px[1], px[2], px[3]])
            .collect();
        Some(Self { data, w, h })
    }

    /// Gray raster where every pixel has R = G = B = `value`.
    pub fn filled_gray(w: usize, h: usize, value: u8) -> Self {
        Self {
            data: vec![[value, value, value, 255]; w * h],
            w,
            h,
        }
    }
}
