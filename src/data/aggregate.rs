use std::fmt;

use super::decoder::{DecodeError, Decoder};
use super::fetch::{FetchError, SoundingSource};
use super::model::{NormalizedSounding, OffsetSource, SoundingCollection};
use super::normalize::normalize;

// ---------------------------------------------------------------------------
// Identifier input: one id or many
// ---------------------------------------------------------------------------

/// Ordered sounding identifiers. A single identifier becomes a
/// one-element sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifiers(Vec<String>);

impl Identifiers {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// The requested identifiers with repeats removed, first occurrence kept.
    pub fn unique(&self) -> Vec<&str> {
        let mut seen = Vec::with_capacity(self.0.len());
        for id in &self.0 {
            if !seen.contains(&id.as_str()) {
                seen.push(id.as_str());
            }
        }
        seen
    }
}

impl From<&str> for Identifiers {
    fn from(id: &str) -> Self {
        Identifiers(vec![id.to_string()])
    }
}

impl From<String> for Identifiers {
    fn from(id: String) -> Self {
        Identifiers(vec![id])
    }
}

impl From<Vec<String>> for Identifiers {
    fn from(ids: Vec<String>) -> Self {
        Identifiers(ids)
    }
}

impl From<&[&str]> for Identifiers {
    fn from(ids: &[&str]) -> Self {
        Identifiers(ids.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Identifiers {
    fn from(ids: [&str; N]) -> Self {
        Identifiers(ids.iter().map(|s| s.to_string()).collect())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why one identifier dropped out of an aggregation.
#[derive(Debug, thiserror::Error)]
pub enum SoundingError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// A failed identifier together with its reason.
#[derive(Debug)]
pub struct SoundingFailure {
    pub id: String,
    pub error: SoundingError,
}

impl fmt::Display for SoundingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.error)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    /// Not a single identifier produced a sounding; nothing should be drawn.
    #[error("no sounding could be loaded ({} failed)", failures.len())]
    EmptyResult { failures: Vec<SoundingFailure> },
}

/// A non-empty collection plus the identifiers that were skipped.
#[derive(Debug)]
pub struct Aggregation {
    pub collection: SoundingCollection,
    pub failures: Vec<SoundingFailure>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Fetch, decode and normalise every identifier, in order.
///
/// One bad identifier never aborts the batch: it is logged, recorded in
/// [`Aggregation::failures`] and skipped. Repeated identifiers are loaded
/// or reported once. Only when nothing succeeds is [`AggregateError::EmptyResult`]
/// returned.
pub fn aggregate<S>(
    ids: impl Into<Identifiers>,
    source: &S,
    decoder: &Decoder,
) -> Result<Aggregation, AggregateError>
where
    S: SoundingSource + ?Sized,
{
    let ids = ids.into();
    let mut collection = SoundingCollection::new();
    let mut failures = Vec::new();

    for id in ids.as_slice() {
        let failed_before = failures.iter().any(|f: &SoundingFailure| &f.id == id);
        if collection.get(id).is_some() || failed_before {
            log::debug!("{id}: repeated identifier, skipping");
            continue;
        }
        match load_one(id, source, decoder) {
            Ok(sounding) => {
                if sounding.offset_source() == OffsetSource::Defaulted {
                    log::warn!("{id}: no surface offset, depths are relative to 0.0");
                }
                log::info!(
                    "{id}: {} samples, ground level {:.2}, deepest {:.2}",
                    sounding.len(),
                    sounding.surface_offset(),
                    sounding.max_explored_reference_depth()
                );
                collection.insert(id.clone(), sounding);
            }
            Err(error) => {
                let failure = SoundingFailure {
                    id: id.clone(),
                    error,
                };
                log::warn!("skipping {failure}");
                failures.push(failure);
            }
        }
    }

    if collection.is_empty() {
        return Err(AggregateError::EmptyResult { failures });
    }
    Ok(Aggregation {
        collection,
        failures,
    })
}

fn load_one<S>(
    id: &str,
    source: &S,
    decoder: &Decoder,
) -> Result<NormalizedSounding, SoundingError>
where
    S: SoundingSource + ?Sized,
{
    let bytes = source.fetch(id)?;
    let raw = decoder.decode(&bytes)?;
    Ok(normalize(raw))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;
    use crate::data::schema::COLUMN_COUNT;

    /// In-memory source; ids without a document answer with HTTP 404.
    struct MapSource {
        docs: HashMap<String, Vec<u8>>,
        requested: RefCell<Vec<String>>,
    }

    impl MapSource {
        fn new(docs: &[(&str, String)]) -> Self {
            Self {
                docs: docs
                    .iter()
                    .map(|(id, doc)| (id.to_string(), doc.clone().into_bytes()))
                    .collect(),
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl SoundingSource for MapSource {
        fn fetch(&self, id: &str) -> Result<Vec<u8>, FetchError> {
            self.requested.borrow_mut().push(id.to_string());
            self.docs.get(id).cloned().ok_or_else(|| FetchError::Status {
                id: id.to_string(),
                status: 404,
            })
        }
    }

    fn doc(offset: f64) -> String {
        let row: Vec<String> = (0..COLUMN_COUNT).map(|i| format!("{}", i as f64 * 0.1)).collect();
        format!(
            r#"<r xmlns:cptcommon="http://www.broservices.nl/xsd/cptcommon/1.1">
                 <cptcommon:offset>{offset}</cptcommon:offset>
                 <cptcommon:values>{};</cptcommon:values></r>"#,
            row.join(",")
        )
    }

    #[test]
    fn test_failed_fetch_is_skipped() {
        let source = MapSource::new(&[("A", doc(1.0))]);
        let agg = aggregate(["A", "B"], &source, &Decoder::default()).unwrap();

        assert_eq!(agg.collection.ids(), vec!["A"]);
        assert_eq!(agg.failures.len(), 1);
        assert_eq!(agg.failures[0].id, "B");
        assert!(matches!(
            agg.failures[0].error,
            SoundingError::Fetch(FetchError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn test_all_failed_is_empty_result() {
        let source = MapSource::new(&[]);
        match aggregate("A", &source, &Decoder::default()) {
            Err(AggregateError::EmptyResult { failures }) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].id, "A");
            }
            Ok(_) => panic!("expected EmptyResult"),
        }
    }

    #[test]
    fn test_decode_failure_does_not_abort_siblings() {
        let source = MapSource::new(&[
            ("A", doc(1.0)),
            ("BAD", "<r/>".to_string()),
            ("C", doc(2.0)),
        ]);
        let agg = aggregate(["A", "BAD", "C"], &source, &Decoder::default()).unwrap();

        assert_eq!(agg.collection.ids(), vec!["A", "C"]);
        assert!(matches!(
            agg.failures[0].error,
            SoundingError::Decode(DecodeError::MissingPayload)
        ));
    }

    #[test]
    fn test_order_follows_request_and_duplicates_load_once() {
        let source = MapSource::new(&[("A", doc(1.0)), ("B", doc(2.0))]);
        let ids = vec!["B".to_string(), "A".to_string(), "B".to_string()];
        let agg = aggregate(ids, &source, &Decoder::default()).unwrap();

        assert_eq!(agg.collection.ids(), vec!["B", "A"]);
        assert_eq!(*source.requested.borrow(), vec!["B", "A"]);
        assert_eq!(agg.collection.get("B").unwrap().surface_offset(), 2.0);
    }

    #[test]
    fn test_repeated_failing_identifier_is_reported_once() {
        let source = MapSource::new(&[("A", doc(1.0))]);
        let agg = aggregate(["X", "A", "X"], &source, &Decoder::default()).unwrap();

        assert_eq!(*source.requested.borrow(), vec!["X", "A"]);
        assert_eq!(agg.failures.len(), 1);
        assert_eq!(agg.failures[0].id, "X");
    }

    #[test]
    fn test_single_identifier_becomes_sequence() {
        let ids: Identifiers = "CPT1".into();
        assert_eq!(ids.as_slice(), &["CPT1".to_string()]);
        assert_eq!(ids.unique(), vec!["CPT1"]);
    }

    #[test]
    fn test_unique_keeps_first_occurrence() {
        let ids: Identifiers = ["B", "A", "B", "C", "A"].into();
        assert_eq!(ids.unique(), vec!["B", "A", "C"]);
    }
}
