pub mod map;
pub mod timeseries;

use crate::error::{ProcessingError, Result};
use plotters::style::RGBColor;

pub use map::{plot_points_on_map, project_web_mercator, MapOptions, MapPoint, MarkerShape};
pub use timeseries::{plot_daily_longterm, plot_hourly_weekly};

/// Default palette, cycled when a chart has no explicit colours.
pub const COLORS: &[&str] = &[
    "#f1b6da", "#c51b7d", "#fdae61", "#d73027", "#a6d96a", "#1a9850", "#abd9e9", "#2166ac",
    "#b2abd2", "#542788", "#bababa", "#4d4d4d",
];

type DrawResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Clone, PartialEq)]
pub struct Series<X> {
    pub label: String,
    pub points: Vec<(X, f64)>,
}

impl<X> Series<X> {
    pub fn new(label: impl Into<String>, points: Vec<(X, f64)>) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub colors: Option<Vec<String>>,
    pub line_styles: Option<Vec<LineStyle>>,
    pub size: (u32, u32),
    pub y_max: Option<f64>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            colors: None,
            line_styles: None,
            size: (1200, 600),
            y_max: None,
        }
    }
}

impl ChartOptions {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    /// Colour and line style for each of `n` series.
    fn series_styles(&self, n: usize) -> Result<Vec<(RGBColor, LineStyle)>> {
        let colors = match &self.colors {
            Some(colors) if colors.len() < n => {
                return Err(ProcessingError::InvalidFormat(format!(
                    "{} colours given for {} series",
                    colors.len(),
                    n
                )))
            }
            Some(colors) => colors
                .iter()
                .take(n)
                .map(|c| parse_hex_color(c))
                .collect::<Result<Vec<_>>>()?,
            None => (0..n)
                .map(|i| parse_hex_color(COLORS[i % COLORS.len()]))
                .collect::<Result<Vec<_>>>()?,
        };

        let styles = match &self.line_styles {
            Some(styles) if styles.len() < n => {
                return Err(ProcessingError::InvalidFormat(format!(
                    "{} line styles given for {} series",
                    styles.len(),
                    n
                )))
            }
            Some(styles) => styles[..n].to_vec(),
            None => vec![LineStyle::Solid; n],
        };

        Ok(colors.into_iter().zip(styles).collect())
    }
}

pub fn parse_hex_color(value: &str) -> Result<RGBColor> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    let invalid = || ProcessingError::InvalidFormat(format!("Invalid colour '{}'", value));

    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

/// Upper y bound: the explicit maximum, else the data maximum plus headroom.
fn y_upper_bound<'a>(values: impl Iterator<Item = &'a f64>, y_max: Option<f64>) -> f64 {
    if let Some(max) = y_max {
        return max;
    }
    let max = values.copied().filter(|v| v.is_finite()).fold(0.0, f64::max);
    if max <= 0.0 {
        1.0
    } else {
        max * 1.05
    }
}

fn ensure_parent_dir(path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn to_plot_error(err: Box<dyn std::error::Error>) -> ProcessingError {
    ProcessingError::Plot(err.to_string())
}
