use crate::data::aggregate::{
    avg_spend_by_profile_dept, growth_by_dept, sales_by_dept_profile, segment_health, sum_by_dept_segment,
    sum_by_dept_year, sum_by_segment, DeptGrowth, DeptProfileSales, DeptSegmentSales, DeptYearSales,
    GrowthYears, SegmentHealth, SegmentSales, SpendMatrix,
};
use crate::data::filter::{filter_records, FilterSelection};
use crate::data::kpi::{compute_kpis, KpiSummary};
use crate::data::model::SalesTable;

// ---------------------------------------------------------------------------
// DashboardView – everything one render cycle needs
// ---------------------------------------------------------------------------

/// All figures shown for one selection.  Built from scratch on every
/// selection change and discarded afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub selection: FilterSelection,
    pub kpis: KpiSummary,
    pub dept_year_sales: Vec<DeptYearSales>,
    /// Years compared by `growth`; `None` when the data spans a single year.
    pub growth_years: Option<GrowthYears>,
    /// Computed over the whole table, not the selection, so a single
    /// selected year can still be compared with another.
    pub growth: Vec<DeptGrowth>,
    pub segment_sales: Vec<SegmentSales>,
    pub dept_segment_sales: Vec<DeptSegmentSales>,
    pub segment_health: Vec<SegmentHealth>,
    pub dept_profile_sales: Vec<DeptProfileSales>,
    pub spend_matrix: SpendMatrix,
}

impl DashboardView {
    /// Filter the table and run every aggregation.
    ///
    /// `growth_years` overrides the comparison years; without it the first
    /// and last year of the table are compared.
    pub fn compute(table: &SalesTable, selection: &FilterSelection, growth_years: Option<GrowthYears>) -> Self {
        let subset = filter_records(table, selection);
        let rows = || subset.iter().copied();

        let growth_years = growth_years.or_else(|| GrowthYears::from_span(table.year_span()));
        let growth = growth_years
            .map(|years| growth_by_dept(&table.records, years))
            .unwrap_or_default();

        log::debug!(
            "Selection year={} departments={} segments={} matched {} of {} records",
            selection.year,
            selection.departments.len(),
            selection.segments.len(),
            subset.len(),
            table.len()
        );

        DashboardView {
            selection: selection.clone(),
            kpis: compute_kpis(rows()),
            dept_year_sales: sum_by_dept_year(rows()),
            growth_years,
            growth,
            segment_sales: sum_by_segment(rows()),
            dept_segment_sales: sum_by_dept_segment(rows()),
            segment_health: segment_health(rows()),
            dept_profile_sales: sales_by_dept_profile(rows()),
            spend_matrix: avg_spend_by_profile_dept(rows()),
        }
    }

    /// Whether the selection matched no records.
    pub fn is_empty(&self) -> bool {
        self.kpis.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::derive::derive_metrics;
    use crate::data::model::SalesRow;

    fn row(year: i32, dept: &str, segment: &str, sales: f64) -> SalesRow {
        SalesRow {
            year,
            department: dept.to_string(),
            segment: segment.to_string(),
            profile: Some("Elite".to_string()),
            sales,
            customers: 10.0,
        }
    }

    fn table() -> SalesTable {
        derive_metrics(vec![
            row(2021, "A", "Core", 50.0),
            row(2022, "A", "Core", 100.0),
            row(2023, "A", "Core", 150.0),
            row(2022, "B", "New", 200.0),
            row(2023, "B", "New", 100.0),
        ])
    }

    #[test]
    fn recomputing_gives_identical_view() {
        let t = table();
        let sel = FilterSelection::all(&t).unwrap();
        let first = DashboardView::compute(&t, &sel, None);
        let second = DashboardView::compute(&t, &sel, None);
        assert_eq!(first, second);
    }

    #[test]
    fn growth_uses_full_table_even_when_filtered() {
        let t = table();
        let sel = FilterSelection::all(&t).unwrap();
        let years = GrowthYears::new(2022, 2023).unwrap();
        let view = DashboardView::compute(&t, &sel, Some(years));

        // The subset only covers 2023, yet both years feed the comparison.
        assert!(view.dept_year_sales.iter().all(|r| r.year == 2023));
        assert_eq!(view.growth_years, Some(years));
        assert_eq!(view.growth[0].growth_percent, Some(50.0));
        assert_eq!(view.growth[1].growth_percent, Some(-50.0));
    }

    #[test]
    fn growth_defaults_to_table_span() {
        let t = table();
        let sel = FilterSelection::all(&t).unwrap();
        let view = DashboardView::compute(&t, &sel, None);
        assert_eq!(view.growth_years, Some(GrowthYears { earlier: 2021, later: 2023 }));
        // A: 50 -> 150; B has no 2021 sales.
        assert_eq!(view.growth[0].growth_percent, Some(200.0));
        assert_eq!(view.growth[1].growth_percent, None);
    }

    #[test]
    fn single_year_table_has_no_growth() {
        let t = derive_metrics(vec![row(2023, "A", "Core", 1.0)]);
        let sel = FilterSelection::all(&t).unwrap();
        let view = DashboardView::compute(&t, &sel, None);
        assert_eq!(view.growth_years, None);
        assert!(view.growth.is_empty());
    }

    #[test]
    fn empty_selection_yields_empty_view() {
        let t = table();
        let mut sel = FilterSelection::all(&t).unwrap();
        sel.segments.clear();
        let view = DashboardView::compute(&t, &sel, None);
        assert!(view.is_empty());
        assert!(view.dept_year_sales.is_empty());
        assert!(view.segment_health.is_empty());
        assert!(view.spend_matrix.is_empty());
        assert_eq!(view.kpis.top_department, None);
        // Growth still reflects the full table.
        assert!(!view.growth.is_empty());
    }
}
