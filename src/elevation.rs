/// Deepest point below the datum, in meters.
const DEPTH: f64 = 8200.0;
/// Highest point above the datum, in meters.
const PEAK: f64 = 21229.0;
/// Channel value that decodes to zero elevation.
pub const ZERO_POINT: f64 = DEPTH / (PEAK + DEPTH) * 256.0;

/// Decode one heightmap pixel into meters.
///
/// The heightmap is 8-bit gray, so only the red channel is read; green and
/// blue are assumed to carry the same value and are not checked.
/// Anything below `ocean_level` comes back as `ocean_level - 1`, which keeps
/// ocean cells strictly out of every later "above ocean" test.
#[inline]
pub fn decode_height(pixel: [u8; 4], ocean_level: f64) -> f64 {
    let r = pixel[0] as f64;
    let h = ((r - ZERO_POINT) / 256.0) * (PEAK + DEPTH);
    if h < ocean_level { ocean_level - 1.0 } else { h }
}
