/// Data layer: schema, retrieval, decoding, normalisation and aggregation.
///
/// Architecture:
/// ```text
///  sounding identifiers
///        │
///        ▼
///   ┌──────────┐
///   │  fetch    │  registry / local dir → XML bytes
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ decoder   │  offset + `;`/`,` payload → RawSounding (schema-bound)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  sort by penetration, referenceDepth = offset - depth
///   └───────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  id → NormalizedSounding, failures skipped
///   └───────────┘
/// ```

pub mod aggregate;
pub mod decoder;
pub mod export;
pub mod fetch;
pub mod model;
pub mod normalize;
pub mod schema;
