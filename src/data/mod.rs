/// Data layer: core types, loading, and aggregate queries.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse rows (via layout) → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  year → YearGroup → Vec<Record>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  query    │  rates, gender table, trend, borough ranking
///   └──────────┘
/// ```

pub mod error;
pub mod layout;
pub mod loader;
pub mod model;
pub mod query;
