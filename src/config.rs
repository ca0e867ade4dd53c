use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest accepted smoothing window. Wider windows already average a whole
/// row on any realistic canvas.
pub const MAX_SMOOTH_STEPS: f64 = 10_000.0;

/// RGBA color; alpha is 0.0..=1.0 like a CSS `rgba()`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn alpha_u8(&self) -> u8 {
        (self.a.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Render settings as they come from the UI. Numbers are text and are only
/// trusted after [`Settings::parse`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub height_scale: String,
    pub ocean_level: String,
    pub smooth_steps: String,
    /// Percent of canvas rows that get a line.
    pub line_density: String,
    pub line_width: String,
    /// Percent, 0..=100.
    pub map_opacity: String,
    pub line_color: Color,
    pub line_background: Color,
    pub background_color: Color,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            height_scale: "240".into(),
            ocean_level: "0".into(),
            smooth_steps: "3".into(),
            line_density: "50".into(),
            line_width: "1".into(),
            map_opacity: "100".into(),
            line_color: Color::rgba(4, 4, 4, 0.85),
            line_background: Color::rgba(255, 255, 255, 1.0),
            background_color: Color::rgba(255, 255, 255, 1.0),
        }
    }
}

/// Validated numeric snapshot of [`Settings`], read once per render.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    pub height_scale: f64,
    pub ocean_level: f64,
    pub smooth_steps: usize,
    pub line_density: f64,
    pub line_width: f32,
    /// 0.0..=1.0
    pub opacity: f32,
    pub line_color: Color,
    pub line_background: Color,
    pub background_color: Color,
}

fn parse_number(field: &'static str, value: &str) -> Result<f64, ConfigError> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ConfigError::NotANumber {
            field,
            value: value.to_string(),
        }),
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value < 0.0 {
        return Err(ConfigError::OutOfRange {
            field,
            expected: "non-negative",
            value,
        });
    }
    Ok(value)
}

impl Settings {
    /// Parse every numeric field. Non-numeric text fails instead of leaking
    /// NaN into the height math.
    pub fn parse(&self) -> Result<RenderConfig, ConfigError> {
        let height_scale = parse_number("heightScale", &self.height_scale)?;
        let ocean_level = parse_number("oceanLevel", &self.ocean_level)?;
        let smooth_steps = non_negative(
            "smoothSteps",
            parse_number("smoothSteps", &self.smooth_steps)?,
        )?;
        if smooth_steps > MAX_SMOOTH_STEPS {
            return Err(ConfigError::OutOfRange {
                field: "smoothSteps",
                expected: "at most 10000",
                value: smooth_steps,
            });
        }
        let line_density = non_negative(
            "lineDensity",
            parse_number("lineDensity", &self.line_density)?,
        )?;
        let line_width = non_negative("lineWidth", parse_number("lineWidth", &self.line_width)?)?;
        let opacity = parse_number("mapOpacity", &self.map_opacity)?.clamp(0.0, 100.0) / 100.0;

        Ok(RenderConfig {
            height_scale,
            ocean_level,
            smooth_steps: smooth_steps.round() as usize,
            line_density,
            // zero width means "default"
            line_width: if line_width == 0.0 { 1.0 } else { line_width as f32 },
            opacity: opacity as f32,
            line_color: self.line_color,
            line_background: self.line_background,
            background_color: self.background_color,
        })
    }
}

impl RenderConfig {
    /// Number of rows to draw on a canvas `canvas_height` pixels tall.
    pub fn row_count(&self, canvas_height: usize) -> usize {
        (canvas_height as f64 * self.line_density / 100.0).round() as usize
    }
}
