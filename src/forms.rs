//! Structured and line-oriented views over form attachments.
//!
//! Winlink form attachments are flat XML (`<tag>value</tag>` pairs);
//! attachment-less submissions carry `Key: value` lines in the plain
//! body. Both flatten into the same ordered `(tag, text)` view so tag
//! lookup and location extraction work uniformly.

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;

use crate::error::FormError;
use crate::geo::GeoPoint;

/// Tag names tried first when locating a coordinate pair, before any
/// type-specific overrides.
pub const DEFAULT_LOCATION_TAGS: &[&str] = &["gps", "latlong", "latitude"];

// ── Document view ───────────────────────────────────────────────────

/// A flattened form document: element names to text, in source order.
#[derive(Debug, Clone, Default)]
pub struct FormDocument {
    entries: Vec<(String, String)>,
}

impl FormDocument {
    /// Parse a flat XML form into an ordered tag/text view.
    pub fn parse(xml: &str) -> Result<Self, FormError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut entries = Vec::new();
        let mut current: Option<String> = None;
        let mut text = String::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    current = Some(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                    text.clear();
                }
                Event::Text(t) => {
                    if current.is_some() {
                        text.push_str(&t.unescape()?);
                    }
                }
                Event::End(_) => {
                    if let Some(tag) = current.take() {
                        entries.push((tag, std::mem::take(&mut text)));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if entries.is_empty() {
            return Err(FormError::Empty);
        }
        Ok(Self { entries })
    }

    /// Build a view from `Key: value` body lines; lines without the
    /// delimiter are skipped.
    pub fn from_lines(body: &str, delimiter: char) -> Self {
        let entries = body
            .lines()
            .filter_map(|line| {
                let (key, value) = line.split_once(delimiter)?;
                let key = key.trim();
                if key.is_empty() {
                    return None;
                }
                Some((key.to_string(), value.trim().to_string()))
            })
            .collect();
        Self { entries }
    }

    /// First matching element's text.
    ///
    /// If the exact-case tag is absent and starts lower-case, retries
    /// with the first character upper-cased — source forms are
    /// inconsistently cased.
    pub fn get(&self, tag: &str) -> Option<&str> {
        if let Some(value) = self.get_exact(tag) {
            return Some(value);
        }
        let mut chars = tag.chars();
        let first = chars.next()?;
        if first.is_lowercase() {
            let retried: String = first.to_uppercase().chain(chars).collect();
            return self.get_exact(&retried);
        }
        None
    }

    fn get_exact(&self, tag: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == tag)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Line-oriented lookup ────────────────────────────────────────────

/// Field value from line-oriented form text: the substring after the
/// first `delimiter` on the first line whose trimmed text starts with
/// `prefix`. `None` when the prefix is never found or the matching line
/// has no delimiter.
pub fn get_from_lines(body: &str, delimiter: char, prefix: &str) -> Option<String> {
    let line = body.lines().find(|l| l.trim_start().starts_with(prefix))?;
    let (_, value) = line.split_once(delimiter)?;
    Some(value.trim().to_string())
}

// ── Location extraction ─────────────────────────────────────────────

/// Search the default tag set, then the type-specific overrides, for
/// the first tag yielding a *valid* coordinate pair.
///
/// A comma-valued tag splits into latitude/longitude directly; a tag
/// named by the latitude convention pairs with its longitude twin by
/// suffix substitution (`latitude` → `longitude`, `lat` → `lon`).
pub fn extract_location(doc: &FormDocument, overrides: &[&str]) -> Option<GeoPoint> {
    for tag in DEFAULT_LOCATION_TAGS.iter().chain(overrides) {
        let Some(value) = doc.get(tag) else {
            continue;
        };

        if let Some((lat, lon)) = value.split_once(',') {
            if let Some(point) = GeoPoint::from_raw(lat.trim(), lon.trim()) {
                return Some(point);
            }
            continue;
        }

        if let Some(lon_tag) = longitude_twin(tag)
            && let Some(lon_value) = doc.get(&lon_tag)
            && let Some(point) = GeoPoint::from_raw(value, lon_value)
        {
            return Some(point);
        }
    }
    debug!(overrides = ?overrides, "no valid coordinate pair in document");
    None
}

/// The tag names a location search will attempt, for rejection context.
pub fn attempted_tags(overrides: &[&str]) -> String {
    DEFAULT_LOCATION_TAGS
        .iter()
        .chain(overrides)
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

/// Longitude tag paired with a latitude-convention tag name.
fn longitude_twin(tag: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    if let Some(stem) = lower.strip_suffix("latitude") {
        return Some(format!("{}longitude", &tag[..stem.len()]));
    }
    if let Some(stem) = lower.strip_suffix("lat") {
        return Some(format!("{}lon", &tag[..stem.len()]));
    }
    None
}
