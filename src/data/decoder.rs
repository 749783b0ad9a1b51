use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use super::model::{OffsetSource, RawSounding, Row};
use super::schema::{COLUMN_COUNT, SCHEMA_VERSION};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that make one CPT document undecodable.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Error parsing XML
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Element text was not valid UTF-8
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A lookup used a prefix that is not in the namespace table
    #[error("namespace prefix '{0}' is not bound")]
    UnboundPrefix(String),

    /// The document has no numeric payload
    #[error("document contains no cptcommon:values payload")]
    MissingPayload,

    /// A payload cell is not a number
    #[error("row {row}, column {column}: '{token}' is not a number")]
    MalformedRow {
        row: usize,
        column: usize,
        token: String,
    },

    /// A payload row does not match the column schema
    #[error("row {row} has {found} columns, expected {expected}")]
    ColumnCountMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// The surface offset element holds something other than a number
    #[error("surface offset '{0}' is not a number")]
    InvalidOffset(String),
}

// ---------------------------------------------------------------------------
// Namespace bindings of the BRO CPT documents
// ---------------------------------------------------------------------------

/// The prefix → URI bindings lookups are resolved through.
pub const BRO_CPT_NAMESPACES: [(&str, &str); 4] = [
    ("dscpt", "http://www.broservices.nl/xsd/dscpt/1.1"),
    ("bro", "http://www.broservices.nl/xsd/brocommon/3.0"),
    ("cpt", "http://www.broservices.nl/xsd/cpt/1.1"),
    ("cptcommon", "http://www.broservices.nl/xsd/cptcommon/1.1"),
];

/// Qualified name of the surface offset element.
pub const OFFSET_ELEMENT: &str = "cptcommon:offset";
/// Qualified name of the delimited numeric payload element.
pub const VALUES_ELEMENT: &str = "cptcommon:values";

/// Prefix → namespace URI table used for element lookups.
///
/// Matching is done on the resolved URI, so documents may use any prefix
/// they like as long as the namespace is the same.
#[derive(Debug, Clone)]
pub struct NamespaceTable {
    bindings: Vec<(String, String)>,
}

impl NamespaceTable {
    pub fn new<'a>(bindings: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            bindings: bindings
                .into_iter()
                .map(|(p, u)| (p.to_string(), u.to_string()))
                .collect(),
        }
    }

    /// The four bindings of the BRO CPT source.
    pub fn bro_cpt() -> Self {
        Self::new(BRO_CPT_NAMESPACES)
    }

    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, u)| u.as_str())
    }

    /// Split `prefix:local` and resolve the prefix to its URI.
    fn qualify<'n>(&self, qname: &'n str) -> Result<ElementName<'_, 'n>, DecodeError> {
        let (prefix, local) = qname.split_once(':').unwrap_or(("", qname));
        let uri = self
            .resolve(prefix)
            .ok_or_else(|| DecodeError::UnboundPrefix(prefix.to_string()))?;
        Ok(ElementName { uri, local })
    }
}

impl Default for NamespaceTable {
    fn default() -> Self {
        Self::bro_cpt()
    }
}

#[derive(Debug, Clone, Copy)]
struct ElementName<'u, 'l> {
    uri: &'u str,
    local: &'l str,
}

impl ElementName<'_, '_> {
    fn matches(&self, ns: &ResolveResult<'_>, local: &[u8]) -> bool {
        matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == self.uri.as_bytes())
            && local == self.local.as_bytes()
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Offset,
    Values,
}

/// Decodes BRO CPT XML documents into [`RawSounding`]s.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    namespaces: NamespaceTable,
}

impl Decoder {
    pub fn new(namespaces: NamespaceTable) -> Self {
        Self { namespaces }
    }

    /// Decode the raw bytes of one retrieved document.
    ///
    /// A missing or empty offset element is not an error: the offset
    /// defaults to `0.0` and the result is flagged
    /// [`OffsetSource::Defaulted`]. A missing or empty payload is.
    pub fn decode(&self, xml: &[u8]) -> Result<RawSounding, DecodeError> {
        let offset_name = self.namespaces.qualify(OFFSET_ELEMENT)?;
        let values_name = self.namespaces.qualify(VALUES_ELEMENT)?;

        let (offset_text, values_text) = extract_texts(xml, offset_name, values_name)?;

        let (surface_offset, offset_source) = match offset_text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                let value = text
                    .parse::<f64>()
                    .map_err(|_| DecodeError::InvalidOffset(text.to_string()))?;
                (value, OffsetSource::Present)
            }
            _ => {
                log::warn!("no {OFFSET_ELEMENT} in document, surface offset defaults to 0.0");
                (0.0, OffsetSource::Defaulted)
            }
        };

        let values_text = values_text.ok_or(DecodeError::MissingPayload)?;
        let rows = parse_payload(&values_text)?;
        if rows.is_empty() {
            return Err(DecodeError::MissingPayload);
        }

        log::debug!(
            "decoded {} rows against {SCHEMA_VERSION}, surface offset {surface_offset}",
            rows.len()
        );
        Ok(RawSounding::new(rows, surface_offset, offset_source))
    }
}

/// Collect the text of the first offset and the first values element, in
/// document order. Elements that are present but empty yield `Some("")`.
fn extract_texts(
    xml: &[u8],
    offset_name: ElementName<'_, '_>,
    values_name: ElementName<'_, '_>,
) -> Result<(Option<String>, Option<String>), DecodeError> {
    let mut reader = NsReader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut offset: Option<String> = None;
    let mut values: Option<String> = None;
    // Element currently being captured and the nesting depth inside it.
    let mut capturing: Option<(Target, usize)> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_resolved_event_into(&mut buf)? {
            (ns, Event::Start(e)) => {
                if let Some((_, depth)) = capturing.as_mut() {
                    *depth += 1;
                } else if offset.is_none() && offset_name.matches(&ns, e.local_name().as_ref()) {
                    offset = Some(String::new());
                    capturing = Some((Target::Offset, 0));
                } else if values.is_none() && values_name.matches(&ns, e.local_name().as_ref()) {
                    values = Some(String::new());
                    capturing = Some((Target::Values, 0));
                }
            }
            (ns, Event::Empty(e)) => {
                if capturing.is_none() {
                    if offset.is_none() && offset_name.matches(&ns, e.local_name().as_ref()) {
                        offset = Some(String::new());
                    } else if values.is_none() && values_name.matches(&ns, e.local_name().as_ref())
                    {
                        values = Some(String::new());
                    }
                }
            }
            (_, Event::Text(t)) => {
                if let Some((target, _)) = capturing {
                    let text = t.unescape()?;
                    push_text(target, &mut offset, &mut values, &text);
                }
            }
            (_, Event::CData(c)) => {
                if let Some((target, _)) = capturing {
                    let text = std::str::from_utf8(&c)?;
                    push_text(target, &mut offset, &mut values, text);
                }
            }
            (_, Event::End(_)) => match capturing {
                Some((_, 0)) => capturing = None,
                Some((target, depth)) => capturing = Some((target, depth - 1)),
                None => {}
            },
            (_, Event::Eof) => break,
            _ => {}
        }
        if offset.is_some() && values.is_some() && capturing.is_none() {
            break;
        }
        buf.clear();
    }

    Ok((offset, values))
}

fn push_text(target: Target, offset: &mut Option<String>, values: &mut Option<String>, text: &str) {
    let slot = match target {
        Target::Offset => offset,
        Target::Values => values,
    };
    if let Some(s) = slot.as_mut() {
        s.push_str(text);
    }
}

// ---------------------------------------------------------------------------
// Payload parsing
// ---------------------------------------------------------------------------

/// Parse a `;`-separated list of `,`-separated numeric rows.
///
/// Blank segments (trailing separators, whitespace) are skipped. Any bad
/// cell or a row of the wrong width fails the whole payload, since a
/// partially parsed row would shift every later column.
pub fn parse_payload(text: &str) -> Result<Vec<Row>, DecodeError> {
    text.split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .enumerate()
        .map(|(row, segment)| parse_row(row, segment))
        .collect()
}

fn parse_row(row: usize, segment: &str) -> Result<Row, DecodeError> {
    let cells = segment
        .split(',')
        .enumerate()
        .map(|(column, tok)| {
            let tok = tok.trim();
            tok.parse::<f64>().map_err(|_| DecodeError::MalformedRow {
                row,
                column,
                token: tok.to_string(),
            })
        })
        .collect::<Result<Vec<f64>, DecodeError>>()?;

    let found = cells.len();
    cells
        .try_into()
        .map_err(|_| DecodeError::ColumnCountMismatch {
            row,
            expected: COLUMN_COUNT,
            found,
        })
}
