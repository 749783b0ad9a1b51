use indexmap::IndexMap;

use super::schema::{self, COLUMN_COUNT};

// ---------------------------------------------------------------------------
// OffsetSource – whether the ground level came from the document
// ---------------------------------------------------------------------------

/// Where a sounding's surface offset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetSource {
    /// The document carried a surface offset element.
    Present,
    /// No offset in the document; `0.0` was substituted so relative depths
    /// stay usable.
    Defaulted,
}

// ---------------------------------------------------------------------------
// RawSounding – decoded matrix of one CPT document
// ---------------------------------------------------------------------------

/// One row of the payload, positionally aligned to [`schema::COLUMN_NAMES`].
pub type Row = [f64; COLUMN_COUNT];

/// The decoded payload of one CPT document.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSounding {
    /// Depth samples; every row has exactly [`COLUMN_COUNT`] values.
    pub rows: Vec<Row>,
    /// Ground level elevation, same vertical unit as `depth`.
    pub surface_offset: f64,
    pub offset_source: OffsetSource,
}

impl RawSounding {
    pub fn new(rows: Vec<Row>, surface_offset: f64, offset_source: OffsetSource) -> Self {
        Self {
            rows,
            surface_offset,
            offset_source,
        }
    }

    /// Column names bound to this matrix.
    pub fn column_names(&self) -> &'static [&'static str] {
        schema::column_names()
    }

    /// Number of depth samples.
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

// ---------------------------------------------------------------------------
// NormalizedSounding – raw sounding placed on the shared vertical datum
// ---------------------------------------------------------------------------

/// A [`RawSounding`] with rows ordered by penetration length and depths
/// expressed relative to the shared datum.
///
/// The derived fields are private: they can only be produced by
/// [`super::normalize::normalize`], so they always agree with `depth` and
/// `surface_offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSounding {
    raw: RawSounding,
    reference_depth: Vec<f64>,
    max_explored_reference_depth: f64,
}

impl NormalizedSounding {
    pub(super) fn from_parts(
        raw: RawSounding,
        reference_depth: Vec<f64>,
        max_explored_reference_depth: f64,
    ) -> Self {
        debug_assert_eq!(raw.rows.len(), reference_depth.len());
        Self {
            raw,
            reference_depth,
            max_explored_reference_depth,
        }
    }

    pub fn raw(&self) -> &RawSounding {
        &self.raw
    }

    pub fn surface_offset(&self) -> f64 {
        self.raw.surface_offset
    }

    pub fn offset_source(&self) -> OffsetSource {
        self.raw.offset_source
    }

    /// `surface_offset - depth` per row; increases upward.
    pub fn reference_depth(&self) -> &[f64] {
        &self.reference_depth
    }

    /// Reference depth of the deepest (last) sample.
    pub fn max_explored_reference_depth(&self) -> f64 {
        self.max_explored_reference_depth
    }

    /// Pairs of `(column value, reference depth)` for plotting.
    pub fn series(&self, column: usize) -> Vec<(f64, f64)> {
        self.raw
            .rows
            .iter()
            .zip(self.reference_depth.iter())
            .map(|(row, &z)| (row[column], z))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }
}

// ---------------------------------------------------------------------------
// SoundingCollection – the aggregated, insertion-ordered result
// ---------------------------------------------------------------------------

/// Identifier → normalized sounding, in the order identifiers were requested.
/// The order drives colour assignment and legend order.
#[derive(Debug, Clone, Default)]
pub struct SoundingCollection {
    soundings: IndexMap<String, NormalizedSounding>,
}

impl SoundingCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a sounding. Keys are unique: a repeated identifier is
    /// rejected and `false` is returned, keeping the first entry.
    pub fn insert(&mut self, id: impl Into<String>, sounding: NormalizedSounding) -> bool {
        let id = id.into();
        if self.soundings.contains_key(&id) {
            return false;
        }
        self.soundings.insert(id, sounding);
        true
    }

    pub fn get(&self, id: &str) -> Option<&NormalizedSounding> {
        self.soundings.get(id)
    }

    /// Identifiers in insertion order.
    pub fn ids(&self) -> Vec<&str> {
        self.soundings.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NormalizedSounding)> {
        self.soundings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of soundings.
    pub fn len(&self) -> usize {
        self.soundings.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.soundings.is_empty()
    }
}
