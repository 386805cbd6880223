/// Chart layer: turns filtered tables into a declarative [`spec::ChartSpec`].
///
/// ```text
///   FilteredTables + Selection
///        │
///        ▼
///   ┌──────────┐
///   │ compose  │  guides, curves, labels → ordered layers
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ ChartSpec│  data-space geometry, axis ticks, titles
///   └──────────┘
/// ```

pub mod compose;
pub mod scale;
pub mod spec;
