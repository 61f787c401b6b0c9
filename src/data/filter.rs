use std::collections::BTreeSet;

use super::model::{SalesRecord, SalesTable};

// ---------------------------------------------------------------------------
// Filter predicate: one year plus department and segment selections
// ---------------------------------------------------------------------------

/// The user's current selection.  An empty department or segment set means
/// nothing is selected for that column, so no record passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub year: i32,
    pub departments: BTreeSet<String>,
    pub segments: BTreeSet<String>,
}

impl FilterSelection {
    /// Every department and segment selected, latest year.  Returns `None`
    /// for a table without any rows.
    pub fn all(table: &SalesTable) -> Option<Self> {
        Some(FilterSelection {
            year: table.latest_year()?,
            departments: table.departments.clone(),
            segments: table.segments.clone(),
        })
    }

    /// Whether a record satisfies all three predicates.
    pub fn matches(&self, record: &SalesRecord) -> bool {
        record.year() == self.year
            && self.departments.contains(record.department())
            && self.segments.contains(record.segment())
    }
}

/// Return the records that pass the selection, in table order.
pub fn filter_records<'a>(table: &'a SalesTable, selection: &FilterSelection) -> Vec<&'a SalesRecord> {
    if selection.departments.is_empty() || selection.segments.is_empty() {
        return Vec::new();
    }
    table
        .records
        .iter()
        .filter(|rec| selection.matches(rec))
        .collect()
}
