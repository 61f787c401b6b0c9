use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

use eframe::egui::{self, vec2, Align2, Color32, FontId, Pos2, Rect, RichText, Sense, Shape, Stroke, Ui};

use sales_dashboard::data::aggregate::{DeptProfileSales, SegmentSales, SpendMatrix};

use crate::color::{normalize, sequential, ColorMap};
use crate::ui::charts::{chart_title, placeholder};

// ---------------------------------------------------------------------------
// Pie chart
// ---------------------------------------------------------------------------

/// Angular step between arc vertices.
const ARC_STEP: f32 = 0.05;

/// Split a wedge into convex polygons no wider than 45° each.
pub fn wedge_polygons(center: Pos2, radius: f32, start: f32, sweep: f32) -> Vec<Vec<Pos2>> {
    if sweep <= 0.0 {
        return Vec::new();
    }
    let pieces = (sweep / FRAC_PI_4).ceil().max(1.0) as usize;
    let piece_sweep = sweep / pieces as f32;
    let steps = (piece_sweep / ARC_STEP).ceil().max(1.0) as usize;

    (0..pieces)
        .map(|p| {
            let a0 = start + piece_sweep * p as f32;
            let mut points = Vec::with_capacity(steps + 2);
            points.push(center);
            for s in 0..=steps {
                let a = a0 + piece_sweep * s as f32 / steps as f32;
                points.push(center + vec2(a.cos(), a.sin()) * radius);
            }
            points
        })
        .collect()
}

/// Sales share per segment.
pub fn segment_pie(ui: &mut Ui, rows: &[SegmentSales], segment_palette: &ColorMap) {
    chart_title(ui, "Sales by Segment");
    let total: f64 = rows.iter().map(|r| r.sales_total.max(0.0)).sum();
    if total <= 0.0 {
        placeholder(ui, "No sales in the current selection.");
        return;
    }

    ui.horizontal(|ui: &mut Ui| {
        let size = 260.0;
        let (response, painter) = ui.allocate_painter(vec2(size, size), Sense::hover());
        let center = response.rect.center();
        let radius = size * 0.45;

        let pointer = response.hover_pos().and_then(|pos| {
            let d = pos - center;
            (d.length() <= radius).then(|| (d.y.atan2(d.x) + FRAC_PI_2).rem_euclid(TAU))
        });

        let mut offset = 0.0_f32;
        let mut hovered = None;
        for r in rows {
            let share = r.sales_total.max(0.0) / total;
            let sweep = share as f32 * TAU;
            let color = segment_palette.color_for(&r.segment);
            for points in wedge_polygons(center, radius, offset - FRAC_PI_2, sweep) {
                painter.add(Shape::convex_polygon(points, color, Stroke::NONE));
            }
            if pointer.is_some_and(|a| a >= offset && a < offset + sweep) {
                hovered = Some(format!("{}: ${:.0} ({:.1}%)", r.segment, r.sales_total, share * 100.0));
            }
            offset += sweep;
        }

        ui.vertical(|ui: &mut Ui| {
            for r in rows {
                let share = r.sales_total.max(0.0) / total * 100.0;
                ui.horizontal(|ui: &mut Ui| {
                    let (swatch, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
                    ui.painter().rect_filled(swatch, 2.0, segment_palette.color_for(&r.segment));
                    ui.label(format!("{}  {share:.1}%", r.segment));
                });
            }
        });

        if let Some(text) = hovered {
            response.on_hover_text(text);
        }
    });
}

// ---------------------------------------------------------------------------
// Treemap
// ---------------------------------------------------------------------------

/// Slice `rect` into consecutive strips proportional to `weights`, along the
/// x axis when `horizontal`, otherwise along y.
pub fn slice_rect(rect: Rect, weights: &[f64], horizontal: bool) -> Vec<Rect> {
    let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    let extent = if horizontal { rect.width() } else { rect.height() };
    let mut cursor = 0.0_f32;
    weights
        .iter()
        .map(|w| {
            let len = (w.max(0.0) / total) as f32 * extent;
            let piece = if horizontal {
                Rect::from_min_size(rect.min + vec2(cursor, 0.0), vec2(len, rect.height()))
            } else {
                Rect::from_min_size(rect.min + vec2(0.0, cursor), vec2(rect.width(), len))
            };
            cursor += len;
            piece
        })
        .collect()
}

/// Department → profile treemap: area is sales, colour is mean spend.
pub fn dept_profile_treemap(ui: &mut Ui, rows: &[DeptProfileSales]) {
    chart_title(ui, "Sales Distribution by Department and Profile");
    if rows.iter().all(|r| r.sales_total <= 0.0) {
        placeholder(ui, "No profiled sales in the current selection.");
        return;
    }

    // Rows arrive ordered by department, then profile.
    let mut groups: Vec<(&str, Vec<&DeptProfileSales>)> = Vec::new();
    for r in rows {
        let same_dept = groups.last().is_some_and(|(dept, _)| *dept == r.department);
        if !same_dept {
            groups.push((r.department.as_str(), Vec::new()));
        }
        if let Some((_, members)) = groups.last_mut() {
            members.push(r);
        }
    }
    let (lo, hi) = rows
        .iter()
        .filter_map(|r| r.avg_sales_per_customer)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let size = vec2(ui.available_width().max(200.0), 360.0);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let dept_totals: Vec<f64> = groups
        .iter()
        .map(|(_, m)| m.iter().map(|r| r.sales_total).sum())
        .collect();

    let header = 18.0;
    let font = FontId::proportional(11.0);
    let mut hovered = None;

    for ((dept, members), dept_rect) in groups.iter().zip(slice_rect(response.rect, &dept_totals, true)) {
        painter.rect_filled(dept_rect.shrink(1.0), 0.0, ui.visuals().extreme_bg_color);
        if dept_rect.width() > 40.0 {
            painter.text(
                dept_rect.left_top() + vec2(4.0, 2.0),
                Align2::LEFT_TOP,
                *dept,
                font.clone(),
                ui.visuals().strong_text_color(),
            );
        }

        let body = Rect::from_min_max(dept_rect.min + vec2(0.0, header), dept_rect.max);
        let weights: Vec<f64> = members.iter().map(|r| r.sales_total).collect();
        for (r, leaf) in members.iter().zip(slice_rect(body, &weights, false)) {
            let fill = match r.avg_sales_per_customer {
                Some(v) => sequential(normalize(v, lo, hi)),
                None => Color32::GRAY,
            };
            let inner = leaf.shrink(1.5);
            painter.rect_filled(inner, 2.0, fill);
            if inner.width() > 50.0 && inner.height() > 16.0 {
                painter.text(inner.left_top() + vec2(3.0, 2.0), Align2::LEFT_TOP, &r.profile, font.clone(), Color32::WHITE);
            }
            if response.hover_pos().is_some_and(|p| inner.contains(p)) {
                let avg = r
                    .avg_sales_per_customer
                    .map_or_else(|| "n/a".to_string(), |v| format!("${v:.2}"));
                hovered = Some(format!("{dept} / {}\nSales: ${:.0}\nAvg spend: {avg}", r.profile, r.sales_total));
            }
        }
    }

    if let Some(text) = hovered {
        response.on_hover_text(text);
    }
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

/// Profile × department matrix of mean spend; empty combinations stay blank.
pub fn spend_heatmap(ui: &mut Ui, matrix: &SpendMatrix) {
    chart_title(ui, "Average Spend by Profile and Department");
    let Some((lo, hi)) = matrix.value_range() else {
        placeholder(ui, "No profiled sales in the current selection.");
        return;
    };

    let cell = vec2(84.0, 26.0);
    egui::ScrollArea::horizontal()
        .id_salt("spend_heatmap_scroll")
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("spend_heatmap")
                .spacing([2.0, 2.0])
                .show(ui, |ui: &mut Ui| {
                    ui.label("");
                    for dept in &matrix.departments {
                        ui.label(RichText::new(dept.as_str()).small().strong());
                    }
                    ui.end_row();

                    for (profile, row) in matrix.profiles.iter().zip(&matrix.cells) {
                        ui.label(RichText::new(profile.as_str()).small().strong());
                        for (dept, value) in matrix.departments.iter().zip(row) {
                            let (rect, response) = ui.allocate_exact_size(cell, Sense::hover());
                            match value {
                                Some(v) => {
                                    let t = normalize(*v, lo, hi);
                                    let text_color = if t > 0.6 { Color32::BLACK } else { Color32::WHITE };
                                    ui.painter().rect_filled(rect, 2.0, sequential(t));
                                    ui.painter().text(
                                        rect.center(),
                                        Align2::CENTER_CENTER,
                                        format!("{v:.1}"),
                                        FontId::proportional(11.0),
                                        text_color,
                                    );
                                    response.on_hover_text(format!("{profile} × {dept}: ${v:.2}"));
                                }
                                None => {
                                    ui.painter().rect_filled(rect, 2.0, ui.visuals().faint_bg_color);
                                }
                            }
                        }
                        ui.end_row();
                    }
                });
        });

    ui.horizontal(|ui: &mut Ui| {
        ui.label(RichText::new(format!("Avg spend ${lo:.1}")).small());
        for i in 0..=10 {
            let (swatch, _) = ui.allocate_exact_size(vec2(14.0, 10.0), Sense::hover());
            ui.painter().rect_filled(swatch, 0.0, sequential(i as f64 / 10.0));
        }
        ui.label(RichText::new(format!("${hi:.1}")).small());
    });
}
