use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;
use uplink_types::{Digest, RelPath};

use crate::error::{StoreError, StoreResult};

/// The persisted fingerprint mapping: relative path to content digest.
///
/// On the wire this is a flat JSON object, e.g.
///
/// ```text
/// {
///   "public/index.html": "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
/// }
/// ```
///
/// Keys are kept sorted so the encoded form is deterministic. A value that
/// is not a digest of this hash function (e.g. a 32-character md5 left by
/// an older tool) is dropped on load, so that file is simply uploaded again.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FingerprintState {
    entries: BTreeMap<RelPath, Digest>,
}

impl FingerprintState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &RelPath) -> Option<&Digest> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &RelPath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn insert(&mut self, path: RelPath, digest: Digest) -> Option<Digest> {
        self.entries.insert(path, digest)
    }

    pub fn remove(&mut self, path: &RelPath) -> Option<Digest> {
        self.entries.remove(path)
    }

    /// Iterate entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&RelPath, &Digest)> {
        self.entries.iter()
    }

    /// Encode as pretty-printed JSON with a trailing newline.
    pub fn to_json_bytes(&self) -> StoreResult<Vec<u8>> {
        let mut data = serde_json::to_vec_pretty(&self.entries)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        data.push(b'\n');
        Ok(data)
    }

    /// Decode from JSON bytes. Blank input is treated as an empty mapping.
    pub fn from_json_bytes(data: &[u8]) -> StoreResult<Self> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new());
        }
        serde_json::from_slice(data).map_err(|e| StoreError::MalformedState(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for FingerprintState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<RelPath, String>::deserialize(deserializer)?;
        let entries = raw
            .into_iter()
            .filter_map(|(path, value)| match Digest::from_hex(&value) {
                Ok(digest) => Some((path, digest)),
                Err(e) => {
                    warn!(path = %path, error = %e, "discarding unreadable fingerprint");
                    None
                }
            })
            .collect();
        Ok(Self { entries })
    }
}

impl FromIterator<(RelPath, Digest)> for FingerprintState {
    fn from_iter<I: IntoIterator<Item = (RelPath, Digest)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FingerprintState {
    type Item = (RelPath, Digest);
    type IntoIter = std::collections::btree_map::IntoIter<RelPath, Digest>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rel(s: &str) -> RelPath {
        RelPath::new(s).unwrap()
    }

    #[test]
    fn encodes_flat_object_with_trailing_newline() {
        let mut state = FingerprintState::new();
        state.insert(rel("a.txt"), Digest::from_bytes(b"a"));
        let bytes = state.to_json_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("{\n  \"a.txt\": \""));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn empty_state_encodes_as_empty_object() {
        let bytes = FingerprintState::new().to_json_bytes().unwrap();
        assert_eq!(bytes, b"{}\n");
    }

    #[test]
    fn blank_input_is_empty() {
        assert!(FingerprintState::from_json_bytes(b"").unwrap().is_empty());
        assert!(FingerprintState::from_json_bytes(b" \n").unwrap().is_empty());
    }

    #[test]
    fn rejects_non_object() {
        let err = FingerprintState::from_json_bytes(b"[1, 2]").unwrap_err();
        assert!(matches!(err, StoreError::MalformedState(_)));
    }

    #[test]
    fn drops_foreign_digest_values() {
        let kept = Digest::from_bytes(b"b").to_hex();
        let json = format!(
            r#"{{"a.txt": "d41d8cd98f00b204e9800998ecf8427e", "b.txt": "{kept}", "c.txt": "zz"}}"#
        );
        let state = FingerprintState::from_json_bytes(json.as_bytes()).unwrap();
        assert_eq!(state.len(), 1);
        assert_eq!(state.get(&rel("b.txt")), Some(&Digest::from_bytes(b"b")));
        assert!(!state.contains(&rel("a.txt")));
    }

    #[test]
    fn rejects_non_string_digest_value() {
        let err = FingerprintState::from_json_bytes(br#"{"a.txt": 5}"#).unwrap_err();
        assert!(matches!(err, StoreError::MalformedState(_)));
    }

    #[test]
    fn rejects_escaping_key() {
        let digest = Digest::from_bytes(b"x").to_hex();
        let json = format!(r#"{{"../secret": "{digest}"}}"#);
        assert!(FingerprintState::from_json_bytes(json.as_bytes()).is_err());
    }

    proptest! {
        #[test]
        fn persist_then_reload_is_identical(
            entries in proptest::collection::btree_map(
                "[a-z]{1,6}(/[a-z]{1,6}){0,3}",
                proptest::collection::vec(any::<u8>(), 0..32),
                0..16,
            )
        ) {
            let state: FingerprintState = entries
                .iter()
                .map(|(path, content)| (rel(path), Digest::from_bytes(content)))
                .collect();
            let bytes = state.to_json_bytes().unwrap();
            let reloaded = FingerprintState::from_json_bytes(&bytes).unwrap();
            prop_assert_eq!(reloaded, state);
        }
    }
}
