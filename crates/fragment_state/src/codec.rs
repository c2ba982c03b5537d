//! Ordered key/value map encoded in the address fragment.
//!
//! Wire grammar: `"#" (key "=" value) *("&" key "=" value)`, with keys and values percent-encoded
//! using `encodeURIComponent` rules. An empty map is `#`.

use std::{borrow::Cow, fmt};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;

use crate::error::DecodeError;

/// Timestamp marker used to force a change event; invisible to the public read/write API.
pub const RESERVED_KEY: &str = "__t";

/// Characters left unescaped by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes one key or value component.
pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

/// Percent-decodes one key or value component.
///
/// # Errors
///
/// Returns an error for truncated/non-hex escapes or when the decoded bytes are not UTF-8.
pub fn decode_component(raw: &str) -> Result<String, DecodeError> {
    let bytes = raw.as_bytes();
    let mut offset = 0;
    while offset < bytes.len() {
        if bytes[offset] == b'%' {
            let well_formed = bytes
                .get(offset + 1..offset + 3)
                .is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit));
            if !well_formed {
                return Err(DecodeError::MalformedEscape { offset });
            }
            offset += 3;
        } else {
            offset += 1;
        }
    }

    percent_decode_str(raw)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|_| DecodeError::InvalidUtf8)
}

/// Returns the `#`-prefixed fragment of a URL or fragment string.
///
/// Input without any `#` (including the empty string) yields `#`.
pub fn normalize_fragment(raw: &str) -> String {
    match raw.find('#') {
        Some(start) => raw[start..].to_string(),
        None => "#".to_string(),
    }
}

fn segment_key(segment: &str) -> &str {
    segment.split_once('=').map_or(segment, |(key, _)| key)
}

/// Rewrites `fragment` so it carries exactly one fresh `__t=<now_ms>` marker.
///
/// Works on raw segments so existing values keep their original encoding. Empty segments left
/// behind by earlier edits (`#&a=1`, `a=1&&b=2`) are dropped.
pub fn with_timestamp(fragment: &str, now_ms: u64) -> String {
    let normalized = normalize_fragment(fragment);
    let mut segments: Vec<Cow<'_, str>> = normalized[1..]
        .split('&')
        .filter(|segment| !segment.is_empty() && segment_key(segment) != RESERVED_KEY)
        .map(Cow::Borrowed)
        .collect();
    segments.push(Cow::Owned(format!("{RESERVED_KEY}={now_ms}")));
    format!("#{}", segments.join("&"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Ordered string map stored in the fragment.
///
/// Keys are unique. Updating an existing key rewrites it in place; new keys are appended.
/// Segments that fail to decode are carried verbatim and written back after the decoded
/// entries, so a merging write does not lose state it cannot read.
pub struct StateMap {
    entries: Vec<(String, String)>,
    undecoded: Vec<String>,
}

impl StateMap {
    /// Creates an empty map.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            undecoded: Vec::new(),
        }
    }

    /// Parses a fragment (with or without the leading `#`) into a map.
    ///
    /// Segments without `=` map to an empty value, segments that fail to decode are hidden from
    /// lookups but kept for [`StateMap::serialize`], and when a key repeats only its first
    /// occurrence is kept.
    pub fn parse(fragment: &str) -> Self {
        let body = fragment.strip_prefix('#').unwrap_or(fragment);
        let mut map = Self::new();
        for segment in body.split('&').filter(|segment| !segment.is_empty()) {
            let (raw_key, raw_value) = segment.split_once('=').unwrap_or((segment, ""));
            let decoded = decode_component(raw_key)
                .and_then(|key| decode_component(raw_value).map(|value| (key, value)));
            match decoded {
                Ok((key, value)) => {
                    if !map.contains_key(&key) {
                        map.entries.push((key, value));
                    }
                }
                Err(err) => {
                    debug!(segment, %err, "keeping undecodable fragment segment verbatim");
                    map.undecoded.push(segment.to_string());
                }
            }
        }
        map
    }

    /// Serializes the map as a `#`-prefixed fragment.
    pub fn serialize(&self) -> String {
        let body = self
            .entries
            .iter()
            .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
            .chain(self.undecoded.iter().cloned())
            .collect::<Vec<_>>()
            .join("&");
        format!("#{body}")
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// Returns whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of decoded entries, including the reserved marker if present.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the map has no entries at all, decodable or not.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.undecoded.is_empty()
    }

    /// Iterates entries in fragment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Returns whether any entry other than the reserved marker exists.
    pub fn has_public_entries(&self) -> bool {
        self.entries.iter().any(|(key, _)| key != RESERVED_KEY)
    }

    /// Sets `key` to `value`, keeping the key's position when it already exists.
    ///
    /// Returns `false` without touching the map for the reserved key or an empty key.
    pub fn merge_set(&mut self, key: &str, value: &str) -> bool {
        if key.is_empty() || key == RESERVED_KEY {
            return false;
        }

        match self.entries.iter_mut().find(|(existing, _)| existing == key) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
        true
    }

    /// Applies [`StateMap::merge_set`] for each update in iteration order.
    ///
    /// Returns the number of updates that were accepted.
    pub fn merge_many<I, K, V>(&mut self, updates: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        updates
            .into_iter()
            .filter(|(key, value)| self.merge_set(key.as_ref(), value.as_ref()))
            .count()
    }

    /// Removes `key`, or every entry (undecodable segments included) when `key` is `None`.
    ///
    /// Returns whether the map changed. Unlike the write path, this may drop the reserved
    /// marker.
    pub fn remove(&mut self, key: Option<&str>) -> bool {
        let before = self.entries.len() + self.undecoded.len();
        match key {
            Some(key) => self.entries.retain(|(existing, _)| existing != key),
            None => {
                self.entries.clear();
                self.undecoded.clear();
            }
        }
        before != self.entries.len() + self.undecoded.len()
    }
}

impl fmt::Display for StateMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for StateMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.merge_many(iter);
        map
    }
}
