use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Source column names
// ---------------------------------------------------------------------------

pub const COL_YEAR: &str = "Year";
pub const COL_DEPARTMENT: &str = "Department Description";
pub const COL_SEGMENT: &str = "Segment Description";
pub const COL_PROFILE: &str = "Profile Description";
pub const COL_SALES: &str = "Sales";
pub const COL_CUSTOMERS: &str = "Customers";

/// Every column a source must expose, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    COL_YEAR,
    COL_DEPARTMENT,
    COL_SEGMENT,
    COL_PROFILE,
    COL_SALES,
    COL_CUSTOMERS,
];

/// Label used in `segment_profile` when a row carries no profile.
pub const ALL_PROFILES: &str = "All Profiles";

// ---------------------------------------------------------------------------
// SalesRow – one row as read from the source
// ---------------------------------------------------------------------------

/// A single row of the source table, before any derived columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRow {
    pub year: i32,
    pub department: String,
    pub segment: String,
    /// `None` when the source cell is empty or null.
    pub profile: Option<String>,
    pub sales: f64,
    pub customers: f64,
}

// ---------------------------------------------------------------------------
// SalesRecord – a row plus its derived metrics
// ---------------------------------------------------------------------------

/// A loaded row together with the metrics derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub row: SalesRow,
    /// `sales / customers`; `None` when the ratio is undefined (zero customers).
    pub sales_per_customer: Option<f64>,
    /// `"<segment> - <profile>"`, or `"<segment> - All Profiles"`.
    pub segment_profile: String,
}

impl SalesRecord {
    pub fn year(&self) -> i32 {
        self.row.year
    }

    pub fn department(&self) -> &str {
        &self.row.department
    }

    pub fn segment(&self) -> &str {
        &self.row.segment
    }

    pub fn profile(&self) -> Option<&str> {
        self.row.profile.as_deref()
    }

    pub fn sales(&self) -> f64 {
        self.row.sales
    }

    pub fn customers(&self) -> f64 {
        self.row.customers
    }
}

// ---------------------------------------------------------------------------
// SalesTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full derived dataset with pre-computed value indices for the filters.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesTable {
    pub records: Vec<SalesRecord>,
    pub years: BTreeSet<i32>,
    pub departments: BTreeSet<String>,
    pub segments: BTreeSet<String>,
    pub profiles: BTreeSet<String>,
}

impl SalesTable {
    /// Build the value indices from derived records.
    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        let mut years = BTreeSet::new();
        let mut departments = BTreeSet::new();
        let mut segments = BTreeSet::new();
        let mut profiles = BTreeSet::new();

        for rec in &records {
            years.insert(rec.year());
            departments.insert(rec.row.department.clone());
            segments.insert(rec.row.segment.clone());
            if let Some(p) = &rec.row.profile {
                profiles.insert(p.clone());
            }
        }

        SalesTable {
            records,
            years,
            departments,
            segments,
            profiles,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent year present in the data.
    pub fn latest_year(&self) -> Option<i32> {
        self.years.last().copied()
    }

    /// `(min, max)` of the available years.
    pub fn year_span(&self) -> Option<(i32, i32)> {
        Some((*self.years.first()?, *self.years.last()?))
    }
}
