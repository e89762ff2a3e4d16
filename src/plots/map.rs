use super::{ensure_parent_dir, parse_hex_color, to_plot_error, DrawResult, COLORS};
use crate::error::{ProcessingError, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::f64::consts::PI;
use std::path::Path;
use tracing::info;

const EARTH_RADIUS_M: f64 = 6_378_137.0;
const MAX_LABELLED_POINTS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub lat: f64,
    pub lon: f64,
    pub label: Option<String>,
    /// Value matched against `MapOptions::group_values`.
    pub group_key: Option<String>,
}

impl MapPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            label: None,
            group_key: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_group_key(mut self, key: &str) -> Self {
        self.group_key = Some(key.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerShape {
    #[default]
    Circle,
    Square,
    Triangle,
    Cross,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub title: String,
    pub size: (u32, u32),
    /// `(min_lon, min_lat, max_lon, max_lat)`; points outside are dropped.
    pub bbox: Option<(f64, f64, f64, f64)>,
    pub group_values: Option<Vec<Vec<String>>>,
    pub colors: Option<Vec<String>>,
    pub markers: Option<Vec<MarkerShape>>,
    pub marker_sizes: Option<Vec<u32>>,
    pub legend_labels: Option<Vec<String>>,
    pub show_labels: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            title: "Points on Map".to_string(),
            size: (1000, 1000),
            bbox: None,
            group_values: None,
            colors: None,
            markers: None,
            marker_sizes: None,
            legend_labels: None,
            show_labels: true,
        }
    }
}

/// Points sharing one colour, marker and legend entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MapGroup<'a> {
    pub label: String,
    pub color: RGBColor,
    pub marker: MarkerShape,
    pub size: u32,
    pub points: Vec<&'a MapPoint>,
}

/// Spherical Web Mercator (EPSG:3857) coordinates in metres.
pub fn project_web_mercator(lat: f64, lon: f64) -> (f64, f64) {
    let x = EARTH_RADIUS_M * lon.to_radians();
    let y = EARTH_RADIUS_M * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

fn in_bbox(point: &MapPoint, bbox: Option<(f64, f64, f64, f64)>) -> bool {
    match bbox {
        Some((min_lon, min_lat, max_lon, max_lat)) => {
            (min_lon..=max_lon).contains(&point.lon) && (min_lat..=max_lat).contains(&point.lat)
        }
        None => true,
    }
}

/// Expand a per-group option: absent -> default, one value -> repeated,
/// otherwise exactly one value per group.
fn per_group<T: Clone>(values: &Option<Vec<T>>, n: usize, default: T, name: &str) -> Result<Vec<T>> {
    match values {
        None => Ok(vec![default; n]),
        Some(v) if v.len() == 1 => Ok(vec![v[0].clone(); n]),
        Some(v) if v.len() == n => Ok(v.clone()),
        Some(_) => Err(ProcessingError::InvalidFormat(format!(
            "{} must have {} values or be a single value",
            name, n
        ))),
    }
}

/// Apply the bbox filter and split points into styled groups.
///
/// Without `group_values` every point lands in one group. With them, a
/// point joins the first group listing its `group_key`; unmatched points
/// are dropped.
pub fn resolve_groups<'a>(points: &'a [MapPoint], options: &MapOptions) -> Result<Vec<MapGroup<'a>>> {
    let visible: Vec<&MapPoint> = points.iter().filter(|p| in_bbox(p, options.bbox)).collect();

    let (members, colors): (Vec<Vec<&MapPoint>>, Vec<String>) = match &options.group_values {
        None => {
            let color = options
                .colors
                .as_ref()
                .and_then(|c| c.first().cloned())
                .unwrap_or_else(|| COLORS[2].to_string());
            (vec![visible], vec![color])
        }
        Some(group_values) => {
            let n = group_values.len();
            let colors = match &options.colors {
                Some(colors) if colors.len() == n => colors.clone(),
                _ => {
                    return Err(ProcessingError::InvalidFormat(format!(
                        "colors must have {} entries to match group_values",
                        n
                    )))
                }
            };

            let mut members = vec![Vec::new(); n];
            for point in visible {
                let group = point.group_key.as_ref().and_then(|key| {
                    group_values.iter().position(|values| values.contains(key))
                });
                if let Some(idx) = group {
                    members[idx].push(point);
                }
            }
            (members, colors)
        }
    };

    let n = members.len();
    let markers = per_group(&options.markers, n, MarkerShape::Circle, "markers")?;
    let sizes = per_group(&options.marker_sizes, n, 6, "marker_sizes")?;
    let labels = match &options.legend_labels {
        None => (1..=n).map(|i| format!("Group {}", i)).collect(),
        Some(labels) if labels.len() == n => labels.clone(),
        Some(_) => {
            return Err(ProcessingError::InvalidFormat(format!(
                "legend_labels must have {} labels",
                n
            )))
        }
    };

    members
        .into_iter()
        .zip(colors)
        .zip(markers.into_iter().zip(sizes))
        .zip(labels)
        .map(|(((points, color), (marker, size)), label)| {
            Ok(MapGroup {
                label,
                color: parse_hex_color(&color)?,
                marker,
                size,
                points,
            })
        })
        .collect()
}

/// Scatter points in Web Mercator space. No basemap is drawn.
pub fn plot_points_on_map(points: &[MapPoint], options: &MapOptions, path: &Path) -> Result<()> {
    let groups = resolve_groups(points, options)?;
    let total: usize = groups.iter().map(|g| g.points.len()).sum();
    if total == 0 {
        return Err(ProcessingError::EmptyInput(
            "no points left to plot".to_string(),
        ));
    }

    let extent = map_extent(&groups, options.bbox);

    ensure_parent_dir(path)?;
    let root = SVGBackend::new(path, options.size).into_drawing_area();
    draw_map(&root, &groups, options, extent, total).map_err(to_plot_error)?;

    info!("Saved map of {} points to {}", total, path.display());
    Ok(())
}

type Extent = ((f64, f64), (f64, f64));

fn map_extent(groups: &[MapGroup], bbox: Option<(f64, f64, f64, f64)>) -> Extent {
    if let Some((min_lon, min_lat, max_lon, max_lat)) = bbox {
        let (x0, y0) = project_web_mercator(min_lat, min_lon);
        let (x1, y1) = project_web_mercator(max_lat, max_lon);
        return ((x0, x1), (y0, y1));
    }

    let projected: Vec<(f64, f64)> = groups
        .iter()
        .flat_map(|g| g.points.iter())
        .map(|p| project_web_mercator(p.lat, p.lon))
        .collect();

    let (mut x0, mut x1, mut y0, mut y1) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    for (x, y) in &projected {
        x0 = x0.min(*x);
        x1 = x1.max(*x);
        y0 = y0.min(*y);
        y1 = y1.max(*y);
    }

    let pad_x = ((x1 - x0) * 0.05).max(500.0);
    let pad_y = ((y1 - y0) * 0.05).max(500.0);
    ((x0 - pad_x, x1 + pad_x), (y0 - pad_y, y1 + pad_y))
}

fn draw_map(
    root: &DrawingArea<SVGBackend, Shift>,
    groups: &[MapGroup],
    options: &MapOptions,
    ((x0, x1), (y0, y1)): Extent,
    total: usize,
) -> DrawResult<()> {
    root.fill(&WHITE)?;

    let mut builder = ChartBuilder::on(root);
    builder.margin(20);
    if !options.title.is_empty() {
        builder.caption(&options.title, ("sans-serif", 26));
    }
    let mut chart = builder.build_cartesian_2d(x0..x1, y0..y1)?;

    for group in groups.iter().filter(|g| !g.points.is_empty()) {
        let style = group.color.mix(0.7).filled();
        let size = group.size as i32;
        let coords = group
            .points
            .iter()
            .map(|p| project_web_mercator(p.lat, p.lon));

        let anno = match group.marker {
            MarkerShape::Circle => {
                chart.draw_series(coords.map(|c| Circle::new(c, size, style)))?
            }
            MarkerShape::Square => chart.draw_series(coords.map(|c| {
                EmptyElement::at(c) + Rectangle::new([(-size, -size), (size, size)], style)
            }))?,
            MarkerShape::Triangle => {
                chart.draw_series(coords.map(|c| TriangleMarker::new(c, size, style)))?
            }
            MarkerShape::Cross => chart.draw_series(
                coords.map(|c| Cross::new(c, size, group.color.stroke_width(2))),
            )?,
        };

        if groups.len() > 1 {
            let color = group.color;
            anno.label(group.label.as_str())
                .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
        }
    }

    if options.show_labels && total <= MAX_LABELLED_POINTS {
        let labelled = groups.iter().flat_map(|g| g.points.iter()).filter_map(|p| {
            p.label.as_ref().map(|label| {
                EmptyElement::at(project_web_mercator(p.lat, p.lon))
                    + Text::new(label.clone(), (6, -14), ("sans-serif", 12).into_font())
            })
        });
        chart.draw_series(labelled)?;
    }

    if groups.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK.mix(0.3))
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;
    }

    root.present()?;
    Ok(())
}
