use std::collections::BTreeMap;

use super::model::SalesRecord;

/// Headline figures over a (usually filtered) set of records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KpiSummary {
    pub record_count: usize,
    /// Total sales in millions.
    pub total_sales_millions: f64,
    /// Total customers in thousands.
    pub total_customers_thousands: f64,
    /// Total sales over total customers; `None` when there are no customers.
    pub avg_spend: Option<f64>,
    /// Department with the highest summed sales; `None` with no records.
    pub top_department: Option<String>,
}

pub fn compute_kpis<'a, I>(rows: I) -> KpiSummary
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut record_count = 0;
    let mut sales = 0.0;
    let mut customers = 0.0;
    let mut by_dept: BTreeMap<&str, f64> = BTreeMap::new();

    for rec in rows {
        record_count += 1;
        sales += rec.sales();
        customers += rec.customers();
        *by_dept.entry(rec.department()).or_default() += rec.sales();
    }

    // Strict comparison keeps the alphabetically first department on ties.
    let mut top: Option<(&str, f64)> = None;
    for (dept, total) in by_dept {
        if top.map_or(true, |(_, best)| total > best) {
            top = Some((dept, total));
        }
    }

    let avg_spend = if customers != 0.0 {
        Some(sales / customers).filter(|v| v.is_finite())
    } else {
        None
    };

    KpiSummary {
        record_count,
        total_sales_millions: sales / 1_000_000.0,
        total_customers_thousands: customers / 1_000.0,
        avg_spend,
        top_department: top.map(|(d, _)| d.to_string()),
    }
}

const UNDEFINED: &str = "n/a";

impl KpiSummary {
    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    pub fn display_total_sales(&self) -> String {
        format!("${:.2}M", self.total_sales_millions)
    }

    pub fn display_total_customers(&self) -> String {
        format!("{:.1}K", self.total_customers_thousands)
    }

    pub fn display_avg_spend(&self) -> String {
        match self.avg_spend {
            Some(v) => format!("${v:.1}"),
            None => UNDEFINED.to_string(),
        }
    }

    pub fn display_top_department(&self) -> String {
        self.top_department
            .clone()
            .unwrap_or_else(|| UNDEFINED.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::derive::derive_metrics;
    use crate::data::model::SalesRow;

    fn row(dept: &str, sales: f64, customers: f64) -> SalesRow {
        SalesRow {
            year: 2023,
            department: dept.to_string(),
            segment: "Core".to_string(),
            profile: None,
            sales,
            customers,
        }
    }

    #[test]
    fn two_record_scenario() {
        let t = derive_metrics(vec![row("Hats", 100.0, 10.0), row("Boots", 200.0, 20.0)]);
        let k = compute_kpis(&t.records);
        assert_eq!(k.record_count, 2);
        assert!((k.total_sales_millions - 0.0003).abs() < 1e-12);
        assert!((k.total_customers_thousands - 0.03).abs() < 1e-12);
        assert_eq!(k.avg_spend, Some(10.0));
        assert_eq!(k.top_department.as_deref(), Some("Boots"));
    }

    #[test]
    fn avg_spend_is_ratio_of_sums() {
        // Per-record ratios 10 and 5 (mean 7.5); ratio of sums is 300 / 50 = 6.
        let t = derive_metrics(vec![row("A", 100.0, 10.0), row("B", 200.0, 40.0)]);
        let k = compute_kpis(&t.records);
        assert_eq!(k.avg_spend, Some(6.0));
    }

    #[test]
    fn top_department_sums_across_records() {
        let t = derive_metrics(vec![
            row("A", 150.0, 1.0),
            row("B", 100.0, 1.0),
            row("B", 100.0, 1.0),
        ]);
        assert_eq!(compute_kpis(&t.records).top_department.as_deref(), Some("B"));
    }

    #[test]
    fn ties_go_to_first_department() {
        let t = derive_metrics(vec![row("Zeta", 50.0, 1.0), row("Alpha", 50.0, 1.0)]);
        assert_eq!(compute_kpis(&t.records).top_department.as_deref(), Some("Alpha"));
    }

    #[test]
    fn empty_subset_is_undefined_not_a_fault() {
        let k = compute_kpis(std::iter::empty());
        assert!(k.is_empty());
        assert_eq!(k.total_sales_millions, 0.0);
        assert_eq!(k.avg_spend, None);
        assert_eq!(k.top_department, None);
        assert_eq!(k.display_avg_spend(), "n/a");
        assert_eq!(k.display_top_department(), "n/a");
    }

    #[test]
    fn zero_customers_leaves_avg_spend_undefined() {
        let t = derive_metrics(vec![row("A", 100.0, 0.0)]);
        let k = compute_kpis(&t.records);
        assert_eq!(k.avg_spend, None);
        assert_eq!(k.top_department.as_deref(), Some("A"));
    }

    #[test]
    fn display_formats() {
        let k = KpiSummary {
            record_count: 3,
            total_sales_millions: 12.3456,
            total_customers_thousands: 4.56,
            avg_spend: Some(27.04),
            top_department: Some("Boots".to_string()),
        };
        assert_eq!(k.display_total_sales(), "$12.35M");
        assert_eq!(k.display_total_customers(), "4.6K");
        assert_eq!(k.display_avg_spend(), "$27.0");
        assert_eq!(k.display_top_department(), "Boots");
    }
}
