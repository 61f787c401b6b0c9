use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, GridMark, Legend, Plot, PlotUi, Points};

use sales_dashboard::data::aggregate::{DeptGrowth, DeptSegmentSales, DeptYearSales, GrowthYears, SegmentHealth};

use crate::color::{diverging, ColorMap};

const PLOT_HEIGHT: f32 = 300.0;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Shown instead of a chart when its table has no rows.
pub fn placeholder(ui: &mut Ui, message: &str) {
    ui.add_space(12.0);
    ui.vertical_centered(|ui: &mut Ui| {
        ui.label(RichText::new(message).italics().weak());
    });
    ui.add_space(12.0);
}

pub fn chart_title(ui: &mut Ui, title: &str) {
    ui.add_space(6.0);
    ui.label(RichText::new(title).strong().size(16.0));
}

/// Label integer x positions with category names.
fn category_axis(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let idx = mark.value.round();
        if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

/// A non-interactive bar plot with category names on the x axis.
fn category_plot(ui: &mut Ui, id: &str, labels: Vec<String>, y_label: &str, add_contents: impl FnOnce(&mut PlotUi)) {
    Plot::new(id)
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .y_axis_label(y_label.to_string())
        .x_axis_formatter(category_axis(labels))
        .allow_scroll(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| add_contents(plot_ui));
}

// ---------------------------------------------------------------------------
// Department analysis
// ---------------------------------------------------------------------------

/// Grouped bar chart: one group per department, one bar per year.
pub fn dept_year_bars(ui: &mut Ui, rows: &[DeptYearSales], years_palette: &ColorMap) {
    chart_title(ui, "Total Sales by Department");
    if rows.is_empty() {
        placeholder(ui, "No records match the current filters.");
        return;
    }

    let departments: Vec<String> = rows
        .iter()
        .map(|r| r.department.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let years: Vec<i32> = rows.iter().map(|r| r.year).collect::<BTreeSet<_>>().into_iter().collect();
    let group_width = 0.8;
    let bar_width = group_width / years.len() as f64;

    let charts: Vec<BarChart> = years
        .iter()
        .enumerate()
        .map(|(yi, &year)| {
            let offset = -group_width / 2.0 + bar_width * (yi as f64 + 0.5);
            let bars = rows
                .iter()
                .filter(|r| r.year == year)
                .filter_map(|r| {
                    let x = departments.iter().position(|d| *d == r.department)? as f64;
                    Some(Bar::new(x + offset, r.sales_total).width(bar_width).name(&r.department))
                })
                .collect();
            BarChart::new(bars)
                .name(year.to_string())
                .color(years_palette.color_for(&year.to_string()))
        })
        .collect();

    category_plot(ui, "dept_year_sales", departments, "Sales", |plot_ui| {
        for chart in charts {
            plot_ui.bar_chart(chart);
        }
    });
}

/// Year-over-year growth per department, coloured red (decline) to green.
pub fn growth_bars(ui: &mut Ui, rows: &[DeptGrowth], years: Option<GrowthYears>) {
    let Some(years) = years else {
        chart_title(ui, "YoY Sales Growth (%)");
        placeholder(ui, "Growth needs at least two years of data.");
        return;
    };
    chart_title(
        ui,
        &format!("YoY Sales Growth (%), {} → {}", years.earlier, years.later),
    );

    let max_abs = rows
        .iter()
        .filter_map(|r| r.growth_percent)
        .fold(0.0_f64, |acc, g| acc.max(g.abs()));
    if rows.iter().all(|r| r.growth_percent.is_none()) {
        placeholder(ui, "No department has sales in both years.");
        return;
    }

    let labels: Vec<String> = rows.iter().map(|r| r.department.clone()).collect();
    let bars: Vec<Bar> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, r)| {
            let g = r.growth_percent?;
            let t = if max_abs > 0.0 { 0.5 + g / (2.0 * max_abs) } else { 0.5 };
            Some(
                Bar::new(i as f64, g)
                    .width(0.7)
                    .name(&r.department)
                    .fill(diverging(t)),
            )
        })
        .collect();

    category_plot(ui, "dept_growth", labels, "Growth (%)", |plot_ui| {
        plot_ui.bar_chart(BarChart::new(bars).name("Growth"));
    });
}

// ---------------------------------------------------------------------------
// Segment analysis
// ---------------------------------------------------------------------------

/// Stacked bars: department on the x axis, one layer per segment.
pub fn dept_segment_bars(ui: &mut Ui, rows: &[DeptSegmentSales], segment_palette: &ColorMap) {
    chart_title(ui, "Segment Performance Across Departments");
    if rows.is_empty() {
        placeholder(ui, "No records match the current filters.");
        return;
    }

    let departments: Vec<String> = rows
        .iter()
        .map(|r| r.department.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let segments: BTreeSet<&str> = rows.iter().map(|r| r.segment.as_str()).collect();

    // Stacking pairs bars by index, so every layer carries one bar per department.
    let mut charts: Vec<BarChart> = Vec::new();
    for segment in segments {
        let bars = departments
            .iter()
            .enumerate()
            .map(|(i, dept)| {
                let value = rows
                    .iter()
                    .find(|r| r.segment == segment && r.department == *dept)
                    .map_or(0.0, |r| r.sales_total);
                Bar::new(i as f64, value).width(0.7).name(format!("{dept} / {segment}"))
            })
            .collect();
        let chart = {
            let below: Vec<&BarChart> = charts.iter().collect();
            BarChart::new(bars)
                .name(segment)
                .color(segment_palette.color_for(segment))
                .stack_on(&below)
        };
        charts.push(chart);
    }

    category_plot(ui, "dept_segment_sales", departments, "Sales", |plot_ui| {
        for chart in charts {
            plot_ui.bar_chart(chart);
        }
    });
}

/// Bubble scatter: customers vs mean spend per customer, bubble area ~ sales.
pub fn segment_health_scatter(ui: &mut Ui, rows: &[SegmentHealth], segment_palette: &ColorMap) {
    chart_title(ui, "Segment Health Matrix (Size = Total Sales)");
    if rows.is_empty() {
        placeholder(ui, "No records match the current filters.");
        return;
    }

    let max_sales = rows.iter().fold(0.0_f64, |acc, r| acc.max(r.sales_total));

    Plot::new("segment_health")
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Customers")
        .y_axis_label("Avg Sales per Customer")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for r in rows {
                let Some(avg) = r.avg_sales_per_customer else {
                    continue;
                };
                let scale = if max_sales > 0.0 { (r.sales_total / max_sales).max(0.0).sqrt() } else { 0.0 };
                let radius = 4.0 + 20.0 * scale as f32;
                plot_ui.points(
                    Points::new(vec![[r.customers_total, avg]])
                        .radius(radius)
                        .filled(true)
                        .name(&r.segment)
                        .color(segment_palette.color_for(&r.segment)),
                );
            }
        });

    segment_health_table(ui, rows);
}

fn segment_health_table(ui: &mut Ui, rows: &[SegmentHealth]) {
    ui.add_space(6.0);
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(140.0))
        .columns(Column::auto().at_least(110.0), 3)
        .header(20.0, |mut header| {
            for title in ["Segment", "Sales", "Customers", "Avg Spend"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for r in rows {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(r.segment.as_str());
                    });
                    row.col(|ui| {
                        ui.label(format!("${:.0}", r.sales_total));
                    });
                    row.col(|ui| {
                        ui.label(format!("{:.0}", r.customers_total));
                    });
                    row.col(|ui| {
                        ui.label(match r.avg_sales_per_customer {
                            Some(v) => format!("${v:.2}"),
                            None => "n/a".to_string(),
                        });
                    });
                });
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(value: f64) -> GridMark {
        GridMark { value, step_size: 1.0 }
    }

    #[test]
    fn category_axis_labels_integer_positions_only() {
        let fmt = category_axis(vec!["Boots".into(), "Hats".into()]);
        let range = 0.0..=2.0;
        assert_eq!(fmt(mark(0.0), &range), "Boots");
        assert_eq!(fmt(mark(1.0), &range), "Hats");
        assert_eq!(fmt(mark(0.5), &range), "");
        assert_eq!(fmt(mark(2.0), &range), "");
        assert_eq!(fmt(mark(-1.0), &range), "");
    }
}
