use std::collections::BTreeSet;
use std::sync::Arc;

use sales_dashboard::{DashboardConfig, DashboardView, DatasetCache, FilterSelection, GrowthYears, SalesTable};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Departments,
    Segments,
    Profiles,
}

/// Category colours shared by every chart of one dataset.
#[derive(Debug, Clone, Default)]
pub struct Palettes {
    pub departments: ColorMap,
    pub segments: ColorMap,
    pub years: ColorMap,
}

impl Palettes {
    fn for_table(table: &SalesTable) -> Self {
        Palettes {
            departments: ColorMap::new(&table.departments),
            segments: ColorMap::new(&table.segments),
            years: ColorMap::new(&table.years),
        }
    }
}

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Dataset (None until a source is configured or the user opens a file).
    pub dataset: Option<DatasetCache>,

    /// Current filter selection; None until a non-empty table is loaded.
    pub selection: Option<FilterSelection>,

    /// Explicit growth comparison years from the configuration.
    pub growth_years: Option<GrowthYears>,

    /// Figures for the current selection (cached until the selection changes).
    pub view: Option<DashboardView>,

    pub palettes: Palettes,

    pub tab: Tab,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: &DashboardConfig) -> Self {
        AppState {
            growth_years: config.growth_years,
            ..AppState::default()
        }
    }

    /// The loaded table, if any.
    pub fn table(&self) -> Option<Arc<SalesTable>> {
        self.dataset.as_ref()?.get().ok()
    }

    /// Load (once) and adopt a dataset. On failure the previous dataset stays.
    pub fn set_dataset(&mut self, dataset: DatasetCache, initial_year: Option<i32>) {
        let table = match dataset.get() {
            Ok(t) => t,
            Err(e) => {
                log::error!("Failed to load {}: {e}", dataset.describe());
                self.status_message = Some(format!("Error: {e}"));
                return;
            }
        };

        self.palettes = Palettes::for_table(&table);
        self.selection = FilterSelection::all(&table).map(|mut sel| {
            if let Some(year) = initial_year.filter(|y| table.years.contains(y)) {
                sel.year = year;
            }
            sel
        });
        if self.selection.is_none() {
            self.status_message = Some(format!("{} contains no records", dataset.describe()));
        } else {
            self.status_message = None;
        }
        self.dataset = Some(dataset);
        self.refresh();
    }

    /// Recompute the view after a selection change.
    pub fn refresh(&mut self) {
        self.view = match (self.table(), &self.selection) {
            (Some(table), Some(sel)) => Some(DashboardView::compute(&table, sel, self.growth_years)),
            _ => None,
        };
    }

    pub fn set_year(&mut self, year: i32) {
        if let Some(sel) = &mut self.selection {
            if sel.year == year {
                return;
            }
            sel.year = year;
        }
        self.refresh();
    }

    pub fn toggle_department(&mut self, department: &str) {
        if let Some(sel) = &mut self.selection {
            toggle(&mut sel.departments, department);
        }
        self.refresh();
    }

    pub fn toggle_segment(&mut self, segment: &str) {
        if let Some(sel) = &mut self.selection {
            toggle(&mut sel.segments, segment);
        }
        self.refresh();
    }

    pub fn select_all_departments(&mut self, all: bool) {
        let Some(table) = self.table() else {
            return;
        };
        if let Some(sel) = &mut self.selection {
            sel.departments = if all { table.departments.clone() } else { BTreeSet::new() };
        }
        self.refresh();
    }

    pub fn select_all_segments(&mut self, all: bool) {
        let Some(table) = self.table() else {
            return;
        };
        if let Some(sel) = &mut self.selection {
            sel.segments = if all { table.segments.clone() } else { BTreeSet::new() };
        }
        self.refresh();
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}
