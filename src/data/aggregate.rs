use std::collections::{BTreeMap, BTreeSet};

use crate::error::ConfigError;

use super::model::SalesRecord;

// ---------------------------------------------------------------------------
// Result rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DeptYearSales {
    pub department: String,
    pub year: i32,
    pub sales_total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeptGrowth {
    pub department: String,
    /// `None` when either year has no sales or the earlier total is zero.
    pub growth_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSales {
    pub segment: String,
    pub sales_total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeptSegmentSales {
    pub department: String,
    pub segment: String,
    pub sales_total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentHealth {
    pub segment: String,
    pub sales_total: f64,
    pub customers_total: f64,
    /// Mean of the per-record ratios (not total sales over total customers).
    pub avg_sales_per_customer: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeptProfileSales {
    pub department: String,
    pub profile: String,
    pub sales_total: f64,
    pub avg_sales_per_customer: Option<f64>,
}

/// Mean spend per customer pivoted as profile (rows) × department (columns).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpendMatrix {
    pub profiles: Vec<String>,
    pub departments: Vec<String>,
    /// `cells[profile_idx][department_idx]`; `None` for combinations without data.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl SpendMatrix {
    pub fn get(&self, profile: &str, department: &str) -> Option<f64> {
        let p = self.profiles.iter().position(|x| x == profile)?;
        let d = self.departments.iter().position(|x| x == department)?;
        self.cells.get(p)?.get(d).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty() || self.departments.is_empty()
    }

    /// Smallest and largest defined cell.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
            })
    }
}

// ---------------------------------------------------------------------------
// Growth comparison years
// ---------------------------------------------------------------------------

/// The pair of years compared by [`growth_by_dept`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthYears {
    pub earlier: i32,
    pub later: i32,
}

impl GrowthYears {
    pub fn new(earlier: i32, later: i32) -> Result<Self, ConfigError> {
        if earlier >= later {
            return Err(ConfigError::GrowthYearOrder { earlier, later });
        }
        Ok(GrowthYears { earlier, later })
    }

    /// The first and last year of a span, when they differ.
    pub fn from_span(span: Option<(i32, i32)>) -> Option<Self> {
        let (earlier, later) = span?;
        GrowthYears::new(earlier, later).ok()
    }
}

// ---------------------------------------------------------------------------
// Accumulators
// ---------------------------------------------------------------------------

/// Running mean over the defined values only.
#[derive(Debug, Default, Clone, Copy)]
struct MeanAcc {
    sum: f64,
    count: usize,
}

impl MeanAcc {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct HealthAcc {
    sales: f64,
    customers: f64,
    ratio: MeanAcc,
}

#[derive(Debug, Default, Clone, Copy)]
struct ProfileAcc {
    sales: f64,
    ratio: MeanAcc,
}

// ---------------------------------------------------------------------------
// Aggregations
// ---------------------------------------------------------------------------

/// Sales summed per (department, year).
pub fn sum_by_dept_year<'a, I>(rows: I) -> Vec<DeptYearSales>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut groups: BTreeMap<(&str, i32), f64> = BTreeMap::new();
    for rec in rows {
        *groups.entry((rec.department(), rec.year())).or_default() += rec.sales();
    }
    groups
        .into_iter()
        .map(|((department, year), sales_total)| DeptYearSales {
            department: department.to_string(),
            year,
            sales_total,
        })
        .collect()
}

/// Percentage sales change per department between the two given years.
pub fn growth_by_dept<'a, I>(rows: I, years: GrowthYears) -> Vec<DeptGrowth>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    // department -> (earlier total, later total)
    let mut pivot: BTreeMap<&str, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for rec in rows {
        let entry = pivot.entry(rec.department()).or_default();
        if rec.year() == years.earlier {
            *entry.0.get_or_insert(0.0) += rec.sales();
        } else if rec.year() == years.later {
            *entry.1.get_or_insert(0.0) += rec.sales();
        }
    }
    pivot
        .into_iter()
        .map(|(department, (earlier, later))| {
            let growth_percent = match (earlier, later) {
                (Some(e), Some(l)) if e != 0.0 => Some((l - e) / e * 100.0),
                _ => None,
            };
            DeptGrowth {
                department: department.to_string(),
                growth_percent,
            }
        })
        .collect()
}

/// Sales summed per segment.
pub fn sum_by_segment<'a, I>(rows: I) -> Vec<SegmentSales>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
    for rec in rows {
        *groups.entry(rec.segment()).or_default() += rec.sales();
    }
    groups
        .into_iter()
        .map(|(segment, sales_total)| SegmentSales {
            segment: segment.to_string(),
            sales_total,
        })
        .collect()
}

/// Sales summed per (department, segment).
pub fn sum_by_dept_segment<'a, I>(rows: I) -> Vec<DeptSegmentSales>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut groups: BTreeMap<(&str, &str), f64> = BTreeMap::new();
    for rec in rows {
        *groups.entry((rec.department(), rec.segment())).or_default() += rec.sales();
    }
    groups
        .into_iter()
        .map(|((department, segment), sales_total)| DeptSegmentSales {
            department: department.to_string(),
            segment: segment.to_string(),
            sales_total,
        })
        .collect()
}

/// Per-segment totals and mean spend per customer.
pub fn segment_health<'a, I>(rows: I) -> Vec<SegmentHealth>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut groups: BTreeMap<&str, HealthAcc> = BTreeMap::new();
    for rec in rows {
        let acc = groups.entry(rec.segment()).or_default();
        acc.sales += rec.sales();
        acc.customers += rec.customers();
        acc.ratio.push(rec.sales_per_customer);
    }
    groups
        .into_iter()
        .map(|(segment, acc)| SegmentHealth {
            segment: segment.to_string(),
            sales_total: acc.sales,
            customers_total: acc.customers,
            avg_sales_per_customer: acc.ratio.mean(),
        })
        .collect()
}

/// Department → profile hierarchy over records that carry a profile.
pub fn sales_by_dept_profile<'a, I>(rows: I) -> Vec<DeptProfileSales>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut groups: BTreeMap<(&str, &str), ProfileAcc> = BTreeMap::new();
    for rec in rows {
        let Some(profile) = rec.profile() else {
            continue;
        };
        let acc = groups.entry((rec.department(), profile)).or_default();
        acc.sales += rec.sales();
        acc.ratio.push(rec.sales_per_customer);
    }
    groups
        .into_iter()
        .map(|((department, profile), acc)| DeptProfileSales {
            department: department.to_string(),
            profile: profile.to_string(),
            sales_total: acc.sales,
            avg_sales_per_customer: acc.ratio.mean(),
        })
        .collect()
}

/// Mean spend per customer pivoted by profile × department.
pub fn avg_spend_by_profile_dept<'a, I>(rows: I) -> SpendMatrix
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut profiles: BTreeSet<&str> = BTreeSet::new();
    let mut departments: BTreeSet<&str> = BTreeSet::new();
    let mut groups: BTreeMap<(&str, &str), MeanAcc> = BTreeMap::new();

    for rec in rows {
        let Some(profile) = rec.profile() else {
            continue;
        };
        profiles.insert(profile);
        departments.insert(rec.department());
        groups
            .entry((profile, rec.department()))
            .or_default()
            .push(rec.sales_per_customer);
    }

    let cells = profiles
        .iter()
        .map(|&p| {
            departments
                .iter()
                .map(|&d| groups.get(&(p, d)).and_then(MeanAcc::mean))
                .collect()
        })
        .collect();

    SpendMatrix {
        profiles: profiles.into_iter().map(str::to_string).collect(),
        departments: departments.into_iter().map(str::to_string).collect(),
        cells,
    }
}
