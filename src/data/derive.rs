use super::model::{SalesRecord, SalesRow, SalesTable, ALL_PROFILES};

/// `sales / customers`, or `None` when the quotient is not a finite number.
pub fn sales_per_customer(sales: f64, customers: f64) -> Option<f64> {
    if customers == 0.0 {
        return None;
    }
    let ratio = sales / customers;
    ratio.is_finite().then_some(ratio)
}

/// Combined segment/profile label.
pub fn segment_profile(segment: &str, profile: Option<&str>) -> String {
    format!("{segment} - {}", profile.unwrap_or(ALL_PROFILES))
}

/// Attach the derived metrics to a single row.
///
/// Both metrics are computed from the raw row fields only, so deriving the
/// same row twice gives the same record.
pub fn derive_record(row: SalesRow) -> SalesRecord {
    let sales_per_customer = sales_per_customer(row.sales, row.customers);
    let segment_profile = segment_profile(&row.segment, row.profile.as_deref());
    SalesRecord {
        row,
        sales_per_customer,
        segment_profile,
    }
}

/// Derive metrics for every loaded row and build the table indices.
pub fn derive_metrics(rows: Vec<SalesRow>) -> SalesTable {
    let records: Vec<SalesRecord> = rows.into_iter().map(derive_record).collect();

    let undefined = records
        .iter()
        .filter(|r| r.sales_per_customer.is_none())
        .count();
    if undefined > 0 {
        log::warn!(
            "{undefined} of {} rows have no customers; their spend per customer is undefined",
            records.len()
        );
    }

    SalesTable::from_records(records)
}
