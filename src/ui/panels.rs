use std::collections::BTreeSet;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use sales_dashboard::data::kpi::KpiSummary;
use sales_dashboard::{DatasetCache, FileSource};

use crate::color::ColorMap;
use crate::state::{AppState, Tab};
use crate::ui::{charts, shapes};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

enum ChecklistAction {
    All,
    None,
    Toggle(String),
}

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    // Clone what we need so we can mutate state inside the panel.
    let (Some(table), Some(selection)) = (state.table(), state.selection.clone()) else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Year");
            let mut year = selection.year;
            egui::ComboBox::from_id_salt("year")
                .selected_text(year.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for &y in &table.years {
                        ui.selectable_value(&mut year, y, y.to_string());
                    }
                });
            if year != selection.year {
                state.set_year(year);
            }
            ui.separator();

            match checklist(
                ui,
                "Departments",
                &table.departments,
                &selection.departments,
                &state.palettes.departments,
            ) {
                Some(ChecklistAction::All) => state.select_all_departments(true),
                Some(ChecklistAction::None) => state.select_all_departments(false),
                Some(ChecklistAction::Toggle(d)) => state.toggle_department(&d),
                None => {}
            }
            ui.separator();

            match checklist(
                ui,
                "Segments",
                &table.segments,
                &selection.segments,
                &state.palettes.segments,
            ) {
                Some(ChecklistAction::All) => state.select_all_segments(true),
                Some(ChecklistAction::None) => state.select_all_segments(false),
                Some(ChecklistAction::Toggle(s)) => state.toggle_segment(&s),
                None => {}
            }
        });
}

/// Collapsible checkbox list with All/None buttons.  Returns the user's
/// action this frame, if any.
fn checklist(
    ui: &mut Ui,
    title: &str,
    all_values: &BTreeSet<String>,
    selected: &BTreeSet<String>,
    colors: &ColorMap,
) -> Option<ChecklistAction> {
    let mut action = None;
    let header_text = format!("{title}  ({}/{})", selected.len(), all_values.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    action = Some(ChecklistAction::All);
                }
                if ui.small_button("None").clicked() {
                    action = Some(ChecklistAction::None);
                }
            });

            for value in all_values {
                let mut checked = selected.contains(value);
                let text = RichText::new(value.as_str()).color(colors.color_for(value));
                if ui.checkbox(&mut checked, text).changed() {
                    action = Some(ChecklistAction::Toggle(value.clone()));
                }
            }
        });

    action
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(ds), Some(table)) = (&state.dataset, state.table()) {
            let visible = state.view.as_ref().map_or(0, |v| v.kpis.record_count);
            ui.label(format!("{}: {} records, {visible} selected", ds.describe(), table.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Central panel – KPI cards and chart tabs
// ---------------------------------------------------------------------------

pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Sales Performance Dashboard");
    ui.label("Analyzing sales by department, customer segments, and profiles");
    ui.add_space(6.0);

    let Some(view) = &state.view else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a dataset to begin  (File → Open…)");
        });
        return;
    };

    kpi_cards(ui, &view.kpis);
    ui.separator();

    let mut tab = state.tab;
    ui.horizontal(|ui: &mut Ui| {
        ui.selectable_value(&mut tab, Tab::Departments, "Department Analysis");
        ui.selectable_value(&mut tab, Tab::Segments, "Customer Segments");
        ui.selectable_value(&mut tab, Tab::Profiles, "Profile Insights");
    });
    ui.separator();

    let palettes = &state.palettes;
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match tab {
            Tab::Departments => {
                ui.heading("Department Performance");
                charts::dept_year_bars(ui, &view.dept_year_sales, &palettes.years);
                charts::growth_bars(ui, &view.growth, view.growth_years);
            }
            Tab::Segments => {
                ui.heading("Customer Segment Analysis");
                ui.columns(2, |cols: &mut [Ui]| {
                    shapes::segment_pie(&mut cols[0], &view.segment_sales, &palettes.segments);
                    charts::dept_segment_bars(&mut cols[1], &view.dept_segment_sales, &palettes.segments);
                });
                charts::segment_health_scatter(ui, &view.segment_health, &palettes.segments);
            }
            Tab::Profiles => {
                ui.heading("Customer Profile Insights");
                shapes::dept_profile_treemap(ui, &view.dept_profile_sales);
                shapes::spend_heatmap(ui, &view.spend_matrix);
            }
        });

    state.tab = tab;
}

fn kpi_cards(ui: &mut Ui, kpis: &KpiSummary) {
    let cards = [
        ("Total Sales", kpis.display_total_sales()),
        ("Total Customers", kpis.display_total_customers()),
        ("Avg Spend per Customer", kpis.display_avg_spend()),
        ("Top Department", kpis.display_top_department()),
    ];
    ui.columns(cards.len(), |cols: &mut [Ui]| {
        for (col, (title, value)) in cols.iter_mut().zip(cards) {
            egui::Frame::group(col.style()).show(col, |ui: &mut Ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(title).weak());
                ui.label(RichText::new(value).size(22.0).strong());
            });
        }
    });
    if kpis.is_empty() {
        ui.label(RichText::new("No records match the current filters.").italics().weak());
    }
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sales data")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv", "xlsx", "xlsm", "xls"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("Excel", &["xlsx", "xlsm", "xls"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.set_dataset(DatasetCache::new(Box::new(FileSource::new(path))), None);
    }
}
