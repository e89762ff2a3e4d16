use super::{
    ensure_parent_dir, to_plot_error, y_upper_bound, ChartOptions, DrawResult, LineStyle, Series,
};
use crate::error::{ProcessingError, Result};
use crate::utils::constants::HOURS_PER_WEEK;
use chrono::{Duration, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::path::Path;
use tracing::info;

const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Line chart of one or more daily series over a shared date axis.
pub fn plot_daily_longterm(
    series: &[Series<NaiveDate>],
    options: &ChartOptions,
    path: &Path,
) -> Result<()> {
    if series.is_empty() {
        return Err(ProcessingError::InvalidFormat(
            "no series to plot".to_string(),
        ));
    }
    let styles = options.series_styles(series.len())?;

    let dates = series.iter().flat_map(|s| s.points.iter().map(|(d, _)| *d));
    let (start, end) = match (dates.clone().min(), dates.max()) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(ProcessingError::EmptyInput(
                "daily series have no points".to_string(),
            ))
        }
    };

    ensure_parent_dir(path)?;
    let root = SVGBackend::new(path, options.size).into_drawing_area();
    draw_daily(&root, series, &styles, options, start, end).map_err(to_plot_error)?;

    info!("Saved daily chart to {}", path.display());
    Ok(())
}

fn draw_daily(
    root: &DrawingArea<SVGBackend, Shift>,
    series: &[Series<NaiveDate>],
    styles: &[(RGBColor, LineStyle)],
    options: &ChartOptions,
    start: NaiveDate,
    end: NaiveDate,
) -> DrawResult<()> {
    root.fill(&WHITE)?;

    let span = (end - start).num_days().max(1) as f64;
    let y_top = y_upper_bound(
        series.iter().flat_map(|s| s.points.iter().map(|(_, v)| v)),
        options.y_max,
    );

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 50);
    if !options.title.is_empty() {
        builder.caption(&options.title, ("sans-serif", 26));
    }
    let mut chart = builder.build_cartesian_2d(0f64..span, 0f64..y_top)?;

    let date_label = |x: &f64| {
        (start + Duration::days(x.round() as i64))
            .format("%Y-%m-%d")
            .to_string()
    };
    chart
        .configure_mesh()
        .x_labels(8)
        .y_labels(6)
        .x_label_formatter(&date_label)
        .y_label_formatter(&|y| format!("{:.0}", y))
        .x_desc(options.x_label.as_str())
        .y_desc(options.y_label.as_str())
        .bold_line_style(&BLACK.mix(0.15))
        .light_line_style(&BLACK.mix(0.05))
        .draw()?;

    for (s, (color, line_style)) in series.iter().zip(styles.iter().copied()) {
        if s.points.is_empty() {
            continue;
        }
        let points: Vec<(f64, f64)> = s
            .points
            .iter()
            .map(|(d, v)| ((*d - start).num_days() as f64, *v))
            .collect();

        let stroke = color.mix(0.8).stroke_width(2);
        let anno = match line_style {
            LineStyle::Solid => chart.draw_series(LineSeries::new(points.clone(), stroke))?,
            LineStyle::Dashed => {
                chart.draw_series(DashedLineSeries::new(points.clone(), 8, 4, stroke))?
            }
        };
        anno.label(s.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

        chart.draw_series(points.iter().map(|&p| Circle::new(p, 2, color.mix(0.8).filled())))?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK.mix(0.3))
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Week profile chart over hour-of-week 0..=167 (Monday 00h first).
///
/// `shade_hours` shades the same `[start, end)` hour window on all seven days.
pub fn plot_hourly_weekly(
    series: &[Series<u32>],
    options: &ChartOptions,
    shade_hours: Option<(u32, u32)>,
    path: &Path,
) -> Result<()> {
    if series.is_empty() {
        return Err(ProcessingError::InvalidFormat(
            "no series to plot".to_string(),
        ));
    }
    if let Some(bad) = series
        .iter()
        .flat_map(|s| s.points.iter())
        .find(|(h, _)| *h >= HOURS_PER_WEEK as u32)
    {
        return Err(ProcessingError::InvalidFormat(format!(
            "hour_of_week {} is outside 0..=167",
            bad.0
        )));
    }
    if let Some((start, end)) = shade_hours {
        if start >= end || end > 24 {
            return Err(ProcessingError::InvalidFormat(format!(
                "shade hours ({}, {}) must satisfy start < end <= 24",
                start, end
            )));
        }
    }
    let styles = options.series_styles(series.len())?;

    ensure_parent_dir(path)?;
    let root = SVGBackend::new(path, options.size).into_drawing_area();
    draw_weekly(&root, series, &styles, options, shade_hours).map_err(to_plot_error)?;

    info!("Saved weekly chart to {}", path.display());
    Ok(())
}

fn draw_weekly(
    root: &DrawingArea<SVGBackend, Shift>,
    series: &[Series<u32>],
    styles: &[(RGBColor, LineStyle)],
    options: &ChartOptions,
    shade_hours: Option<(u32, u32)>,
) -> DrawResult<()> {
    root.fill(&WHITE)?;

    let y_top = y_upper_bound(
        series.iter().flat_map(|s| s.points.iter().map(|(_, v)| v)),
        options.y_max,
    );
    let day_ticks: Vec<i32> = (0..=7).map(|day| day * 24).collect();

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 50);
    if !options.title.is_empty() {
        builder.caption(&options.title, ("sans-serif", 26));
    }
    let mut chart = builder.build_cartesian_2d(
        (0..HOURS_PER_WEEK as i32).with_key_points(day_ticks),
        0f64..y_top,
    )?;

    chart
        .configure_mesh()
        .y_labels(6)
        .x_label_formatter(&|h| format!("{} 0h", WEEKDAY_LABELS[((*h / 24) % 7) as usize]))
        .y_label_formatter(&|y| format!("{:.1}", y))
        .x_desc(options.x_label.as_str())
        .y_desc(options.y_label.as_str())
        .bold_line_style(&BLACK.mix(0.15))
        .light_line_style(&BLACK.mix(0.05))
        .draw()?;

    if let Some((start, end)) = shade_hours {
        let shade = RGBColor(128, 128, 128).mix(0.15).filled();
        chart.draw_series((0..7).map(|day| {
            let x0 = day * 24 + start as i32;
            let x1 = day * 24 + end as i32;
            Rectangle::new([(x0, 0.0), (x1, y_top)], shade)
        }))?;
    }

    for day in 1..7 {
        chart.draw_series(DashedLineSeries::new(
            vec![(day * 24, 0.0), (day * 24, y_top)],
            6,
            4,
            RGBColor(128, 128, 128).mix(0.4).stroke_width(1),
        ))?;
    }

    for (s, (color, line_style)) in series.iter().zip(styles.iter().copied()) {
        if s.points.is_empty() {
            continue;
        }
        let points: Vec<(i32, f64)> = s.points.iter().map(|(h, v)| (*h as i32, *v)).collect();

        let stroke = color.mix(0.8).stroke_width(2);
        let anno = match line_style {
            LineStyle::Solid => chart.draw_series(LineSeries::new(points.clone(), stroke))?,
            LineStyle::Dashed => {
                chart.draw_series(DashedLineSeries::new(points.clone(), 8, 4, stroke))?
            }
        };
        anno.label(s.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

        chart.draw_series(points.iter().map(|&p| Circle::new(p, 1, color.mix(0.7).filled())))?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK.mix(0.3))
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(())
}
