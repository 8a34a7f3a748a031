/// Data layer: core types, loading, caching and querying.
///
/// Architecture:
/// ```text
///  timmerman_constraints.csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse + normalise → Dataset   (memoised by cache)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset  │  Vec<ConstraintRow>, read-only
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  (fraction, type filter, organ) → ResultSet
///   └──────────┘
/// ```
pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
