/// Data layer: core types, loading, derivation, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet / .xlsx  (file, URL or embedded bytes)
///        │
///        ▼
///   ┌──────────┐
///   │  source   │  TableSource::read → Vec<SalesRow>   (loader parses)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  derive   │  spend per customer, segment/profile label → SalesTable
///   └──────────┘
///        │   (cached once in DatasetCache, shared as Arc)
///        ▼
///   ┌──────────┐
///   │  filter   │  year + departments + segments → Vec<&SalesRecord>
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ aggregate / kpi │  grouped sums, means, pivots, headline figures
///   └────────────────┘
/// ```

pub mod aggregate;
pub mod derive;
pub mod filter;
pub mod kpi;
pub mod loader;
pub mod model;
pub mod source;
