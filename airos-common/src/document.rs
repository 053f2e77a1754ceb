//! Device status document and field lookup helpers.
//!
//! A status document is the union of the three reads performed against an
//! airOS device: the flat `mca-status` key/value listing, the nested
//! `status.cgi` JSON and the `wstalist` station array. The structure is kept
//! as raw JSON because firmware versions differ in which keys they report.
//!
//! Two lookup contracts are offered:
//!
//! - [`try_get`] walks a JSON pointer and yields `None` when any level is
//!   missing, so callers can substitute a default.
//! - [`must_get`] is a direct top-level lookup that fails with
//!   [`FieldError::Missing`]; a failed strict lookup fails the whole poll.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Failure to read a required status field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("missing status field '{field}'")]
    Missing { field: String },

    #[error("status field '{field}' is not numeric: {value}")]
    NotNumeric { field: String, value: String },
}

/// Defensive lookup: follow a JSON pointer, `None` if any level is absent.
pub fn try_get<'a>(value: &'a Value, pointer: &str) -> Option<&'a Value> {
    value.pointer(pointer)
}

/// Strict lookup: a missing or null key is an error.
pub fn must_get<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a Value, FieldError> {
    match map.get(key) {
        Some(Value::Null) | None => Err(FieldError::Missing {
            field: key.to_string(),
        }),
        Some(value) => Ok(value),
    }
}

/// Coerce a JSON value to a float.
///
/// airOS reports most figures as strings, so numeric strings are accepted.
pub fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Coerce a JSON value to an unsigned counter.
///
/// Fractional numbers are truncated; fractional strings are rejected.
fn counter_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn not_numeric(field: &str, value: &Value) -> FieldError {
    FieldError::NotNumeric {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Operational status of one airOS device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusDocument {
    /// Flat `mca-status` listing.
    #[serde(default)]
    pub mca_status: Map<String, Value>,

    /// Nested `status.cgi` document.
    #[serde(default)]
    pub status: Value,

    /// Remote stations from `wstalist`.
    #[serde(default)]
    pub stations: Vec<Value>,
}

impl StatusDocument {
    /// Create a document from its three parts.
    pub fn new(mca_status: Map<String, Value>, status: Value, stations: Vec<Value>) -> Self {
        Self {
            mca_status,
            status,
            stations,
        }
    }

    /// Read an `mca-status` value as text, falling back to `default`.
    pub fn text_or(&self, key: &str, default: &str) -> String {
        self.mca_status
            .get(key)
            .and_then(text_of)
            .unwrap_or_else(|| default.to_string())
    }

    /// Read a required numeric `mca-status` value.
    pub fn must_number(&self, key: &str) -> Result<f64, FieldError> {
        let value = must_get(&self.mca_status, key)?;
        number_of(value).ok_or_else(|| not_numeric(key, value))
    }

    /// Read a required counter from `mca-status`.
    pub fn must_counter(&self, key: &str) -> Result<u64, FieldError> {
        let value = must_get(&self.mca_status, key)?;
        counter_of(value).ok_or_else(|| not_numeric(key, value))
    }

    /// Read a nested numeric `status.cgi` value, falling back to `default`.
    pub fn status_number_or(&self, pointer: &str, default: f64) -> f64 {
        try_get(&self.status, pointer)
            .and_then(number_of)
            .unwrap_or(default)
    }

    /// Iterate over the remote stations.
    pub fn stations(&self) -> impl Iterator<Item = Station<'_>> {
        self.stations.iter().map(Station::new)
    }

    /// Number of remote stations.
    pub fn station_count(&self) -> usize {
        self.stations.len()
    }
}

/// View over one `wstalist` entry.
#[derive(Debug, Clone, Copy)]
pub struct Station<'a> {
    entry: &'a Value,
}

impl<'a> Station<'a> {
    pub fn new(entry: &'a Value) -> Self {
        Self { entry }
    }

    /// Whether the station carries the extended `remote` record.
    pub fn has_remote(&self) -> bool {
        self.entry.get("remote").is_some()
    }

    /// Station MAC address, empty if unknown.
    pub fn mac(&self) -> String {
        self.text_or("/mac", "")
    }

    /// Last known IP address, empty if unknown.
    pub fn last_ip(&self) -> String {
        self.text_or("/lastip", "")
    }

    /// Hostname from the `remote` record, else the flat `name`, else empty.
    pub fn hostname(&self) -> String {
        try_get(self.entry, "/remote/hostname")
            .or_else(|| try_get(self.entry, "/name"))
            .and_then(text_of)
            .unwrap_or_default()
    }

    /// Numeric value at `pointer`, `None` if absent or not numeric.
    pub fn number(&self, pointer: &str) -> Option<f64> {
        try_get(self.entry, pointer).and_then(number_of)
    }

    /// Numeric value at `pointer`, falling back to `default`.
    pub fn number_or(&self, pointer: &str, default: f64) -> f64 {
        self.number(pointer).unwrap_or(default)
    }

    fn text_or(&self, pointer: &str, default: &str) -> String {
        try_get(self.entry, pointer)
            .and_then(text_of)
            .unwrap_or_else(|| default.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mca(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_try_get_nested() {
        let status = json!({"board": {"radio": [{"antenna": [{"gain": 13}]}]}});
        assert_eq!(
            try_get(&status, "/board/radio/0/antenna/0/gain"),
            Some(&json!(13))
        );
    }

    #[test]
    fn test_try_get_missing_levels() {
        assert!(try_get(&json!({}), "/board/radio/0/antenna/0/gain").is_none());
        assert!(try_get(&json!({"board": {}}), "/board/radio/0").is_none());
        assert!(try_get(&json!({"board": {"radio": []}}), "/board/radio/0").is_none());
        assert!(try_get(&Value::Null, "/board").is_none());
    }

    #[test]
    fn test_must_get_missing() {
        let map = mca(json!({"signal": "-60", "noise": null}));
        assert!(must_get(&map, "signal").is_ok());
        assert_eq!(
            must_get(&map, "ccq"),
            Err(FieldError::Missing {
                field: "ccq".to_string()
            })
        );
        assert!(matches!(
            must_get(&map, "noise"),
            Err(FieldError::Missing { .. })
        ));
    }

    #[test]
    fn test_number_of() {
        assert_eq!(number_of(&json!(42)), Some(42.0));
        assert_eq!(number_of(&json!("144.4")), Some(144.4));
        assert_eq!(number_of(&json!(" -61 ")), Some(-61.0));
        assert_eq!(number_of(&json!(true)), Some(1.0));
        assert_eq!(number_of(&json!("n/a")), None);
        assert_eq!(number_of(&json!({})), None);
    }

    #[test]
    fn test_must_number_not_numeric() {
        let doc = StatusDocument::new(mca(json!({"ccq": "high"})), json!({}), vec![]);
        let err = doc.must_number("ccq").unwrap_err();
        assert!(matches!(err, FieldError::NotNumeric { .. }));
        assert!(err.to_string().contains("ccq"));
    }

    #[test]
    fn test_must_counter() {
        let doc = StatusDocument::new(
            mca(json!({"lanRxBytes": "123456", "wlanTxBytes": 99, "lanTxBytes": "1.5"})),
            json!({}),
            vec![],
        );
        assert_eq!(doc.must_counter("lanRxBytes"), Ok(123456));
        assert_eq!(doc.must_counter("wlanTxBytes"), Ok(99));
        assert!(doc.must_counter("lanTxBytes").is_err());
        assert!(doc.must_counter("wlanRxBytes").is_err());
    }

    #[test]
    fn test_text_or_default() {
        let doc = StatusDocument::new(mca(json!({"deviceName": "tower-a"})), json!({}), vec![]);
        assert_eq!(doc.text_or("deviceName", ""), "tower-a");
        assert_eq!(doc.text_or("wlanOpmode", ""), "");
    }

    #[test]
    fn test_status_number_or() {
        let doc = StatusDocument::new(
            Map::new(),
            json!({"wireless": {"polling": {"quality": 87}}}),
            vec![],
        );
        assert_eq!(doc.status_number_or("/wireless/polling/quality", 0.0), 87.0);
        assert_eq!(doc.status_number_or("/wireless/polling/capacity", 0.0), 0.0);
    }

    #[test]
    fn test_station_hostname_fallbacks() {
        let with_remote = json!({"name": "flat", "remote": {"hostname": "nested"}});
        let flat = json!({"name": "flat"});
        let bare = json!({"mac": "00:11:22:33:44:55"});

        assert_eq!(Station::new(&with_remote).hostname(), "nested");
        assert_eq!(Station::new(&flat).hostname(), "flat");
        assert_eq!(Station::new(&bare).hostname(), "");
        assert_eq!(Station::new(&bare).mac(), "00:11:22:33:44:55");
        assert_eq!(Station::new(&bare).last_ip(), "");
    }

    #[test]
    fn test_station_has_remote() {
        assert!(Station::new(&json!({"remote": {}})).has_remote());
        assert!(!Station::new(&json!({"name": "x"})).has_remote());
    }

    #[test]
    fn test_deserialize_document() {
        let doc: StatusDocument = serde_json::from_value(json!({
            "mca_status": {"deviceId": "abc"},
            "stations": [{"mac": "aa"}]
        }))
        .unwrap();

        assert_eq!(doc.text_or("deviceId", ""), "abc");
        assert_eq!(doc.station_count(), 1);
        assert_eq!(doc.status, Value::Null);
    }
}
