//! Tests for polyline fill/stroke.

mod common;

use common::{DrawCall, RecordingSurface};
use ridgeline::render::{LineStyle, clear_scene, draw_polyline};
use ridgeline::{Color, Point};

fn style(window: usize) -> LineStyle {
    LineStyle {
        stroke: Color::rgba(0, 0, 0, 1.0),
        fill: Color::rgba(255, 255, 255, 1.0),
        background: Color::rgba(200, 200, 200, 1.0),
        width: 1.5,
        opacity: 0.8,
        smooth_window: window,
    }
}

fn pts(ys: &[f32]) -> Vec<Point> {
    ys.iter()
        .enumerate()
        .map(|(x, &y)| Point::new(x as f32, y))
        .collect()
}

#[test]
fn test_short_runs_are_never_drawn() {
    let mut surface = RecordingSurface::new(10, 10);
    assert!(!draw_polyline(&mut surface, &[], &style(0)));
    assert!(!draw_polyline(&mut surface, &pts(&[1.0]), &style(0)));
    assert!(!draw_polyline(&mut surface, &pts(&[1.0, 9.0]), &style(0)));
    assert_eq!(surface.draw_count(), 0);
}

#[test]
fn test_flat_run_is_stroked_without_fill() {
    let mut surface = RecordingSurface::new(10, 10);
    assert!(draw_polyline(&mut surface, &pts(&[5.0, 5.0, 5.5, 5.0]), &style(0)));
    assert!(surface.fills().is_empty());
    assert_eq!(surface.strokes().len(), 1);
}

#[test]
fn test_tall_run_is_filled_then_stroked() {
    let mut surface = RecordingSurface::new(10, 10);
    draw_polyline(&mut surface, &pts(&[8.0, 2.0, 8.0]), &style(0));

    assert_eq!(surface.calls.len(), 2);
    let DrawCall::Fill(outline) = &surface.calls[0] else {
        panic!("expected fill first, got {:?}", surface.calls[0]);
    };
    // smoothed line, then closed along y = max back to the first x
    assert_eq!(
        outline,
        &vec![
            Point::new(0.0, 8.0),
            Point::new(1.0, 2.0),
            Point::new(2.0, 8.0),
            Point::new(2.0, 8.0),
            Point::new(0.0, 8.0),
        ]
    );
    let DrawCall::Stroke(line) = &surface.calls[1] else {
        panic!("expected stroke second");
    };
    assert_eq!(line, &pts(&[8.0, 2.0, 8.0]));
}

#[test]
fn test_stroke_uses_smoothed_points() {
    let mut surface = RecordingSurface::new(10, 10);
    draw_polyline(&mut surface, &pts(&[0.0, 10.0, 20.0]), &style(1));
    let strokes = surface.strokes();
    let ys: Vec<f32> = strokes[0].iter().map(|p| p.y).collect();
    assert_eq!(ys, vec![5.0, 10.0, 15.0]);
    // range 10 > 1, so the fill closes at the smoothed max
    let fill = surface.fills()[0];
    assert_eq!(fill[fill.len() - 1], Point::new(0.0, 15.0));
}

#[test]
fn test_clear_scene_sets_background_and_opacity() {
    let mut surface = RecordingSurface::new(4, 4);
    clear_scene(&mut surface, &style(0));
    assert_eq!(
        surface.calls,
        vec![
            DrawCall::Clear(Color::rgba(200, 200, 200, 1.0)),
            DrawCall::Opacity(0.8),
        ]
    );
}
