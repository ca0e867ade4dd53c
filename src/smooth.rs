use crate::surface::Point;

/// Smoothed polyline and the vertical extent of the smoothed points.
#[derive(Clone, Debug, PartialEq)]
pub struct Smoothed {
    pub points: Vec<Point>,
    pub min: f32,
    pub max: f32,
}

/// Moving average over y with a window of `window` vertices on each side.
///
/// The window is clipped at both ends of the polyline, so boundary vertices
/// average fewer neighbors. x passes through untouched. Min and max of the
/// smoothed y come out of the same pass.
pub fn smooth(points: &[Point], window: usize) -> Smoothed {
    let n = points.len();

    // prefix[i] = sum of y over points[..i]
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0f64);
    for p in points {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + p.y as f64);
    }

    let mut out = Vec::with_capacity(n);
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for (i, p) in points.iter().enumerate() {
        let from = i.saturating_sub(window);
        let to = i.saturating_add(window).saturating_add(1).min(n);
        let y = ((prefix[to] - prefix[from]) / (to - from) as f64) as f32;
        min = min.min(y);
        max = max.max(y);
        out.push(Point::new(p.x, y));
    }

    Smoothed {
        points: out,
        min,
        max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(ys: &[f32]) -> Vec<Point> {
        ys.iter()
            .enumerate()
            .map(|(x, &y)| Point::new(x as f32, y))
            .collect()
    }

    #[test]
    fn averages_clipped_window() {
        let s = smooth(&line(&[0.0, 10.0, 20.0]), 1);
        let ys: Vec<f32> = s.points.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![5.0, 10.0, 15.0]);
        assert_eq!(s.min, 5.0);
        assert_eq!(s.max, 15.0);
    }

    #[test]
    fn zero_window_is_identity() {
        let input = line(&[3.0, -1.0, 8.0, 2.0]);
        let s = smooth(&input, 0);
        assert_eq!(s.points, input);
        assert_eq!(s.min, -1.0);
        assert_eq!(s.max, 8.0);
    }

    #[test]
    fn wide_window_flattens_to_mean() {
        let s = smooth(&line(&[1.0, 2.0, 3.0, 6.0]), 10);
        for p in &s.points {
            assert_eq!(p.y, 3.0);
        }
        assert_eq!(s.max - s.min, 0.0);
    }

    #[test]
    fn unbounded_window_saturates() {
        let s = smooth(&line(&[1.0, 2.0, 3.0, 6.0]), usize::MAX);
        assert!(s.points.iter().all(|p| p.y == 3.0));
    }

    #[test]
    fn preserves_x_and_bounds_every_height() {
        let input: Vec<Point> = (0..50)
            .map(|i| Point::new(i as f32 * 1.5 + 3.0, ((i * 37) % 11) as f32 - 4.0))
            .collect();
        for window in [0, 1, 2, 5, 60] {
            let s = smooth(&input, window);
            assert_eq!(s.points.len(), input.len());
            for (a, b) in input.iter().zip(&s.points) {
                assert_eq!(a.x, b.x);
                assert!(s.min <= b.y && b.y <= s.max);
            }
        }
    }
}
