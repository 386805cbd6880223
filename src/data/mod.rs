/// Data layer: table types, loading, caching, and filtering.
///
/// Architecture:
/// ```text
///  MSC.csv / curvedata.csv / HC.csv  (.json and .parquet also accepted)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse files → Tables
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  one Arc<Tables> per path set
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  antibiotic / level / cutoff predicates → borrowed views
///   └──────────┘
/// ```

pub mod cache;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
