//! Attribute extraction from release detail documents
//!
//! A detail document is decoded into a typed shape: a required integral `id`
//! (`42` and `42.0` are the same release) plus optional `artists`, `styles` and `genres` lists. List entries are
//! filtered rather than validated, so one odd entry never costs the whole
//! release:
//!
//! - an artist is kept when it is an object with a string `name`
//! - a style or genre is kept when it is a string
//!
//! A list that is absent or `null` is empty. A list field holding anything
//! other than an array is a decode error.

use crate::error::{MetadataError, Result};
use core_library::models::Release;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

#[derive(Debug, Deserialize)]
struct ReleaseDocument {
    #[serde(deserialize_with = "integral_id")]
    id: i64,
    #[serde(default)]
    artists: Option<Vec<Value>>,
    #[serde(default)]
    styles: Option<Vec<Value>>,
    #[serde(default)]
    genres: Option<Vec<Value>>,
}

fn integral_id<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Number::deserialize(deserializer)?;
    if let Some(id) = number.as_i64() {
        return Ok(id);
    }

    match number.as_f64() {
        Some(id) if id.fract() == 0.0 && id >= i64::MIN as f64 && id < i64::MAX as f64 => {
            Ok(id as i64)
        }
        _ => Err(D::Error::custom(format!(
            "release id must be an integer, got {}",
            number
        ))),
    }
}

/// Decode a JSON body that must be an object
///
/// serde maps arrays onto structs positionally, so non-objects are rejected
/// before the typed decode.
pub(crate) fn decode_object<T: DeserializeOwned>(payload: &[u8], context: &str) -> Result<T> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|e| MetadataError::decode(context, e))?;

    if !value.is_object() {
        return Err(MetadataError::decode(context, "expected a JSON object"));
    }

    serde_json::from_value(value).map_err(|e| MetadataError::decode(context, e))
}

fn artist_names(entries: Option<Vec<Value>>) -> Vec<String> {
    entries
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| match entry {
            Value::Object(mut fields) => match fields.remove("name") {
                Some(Value::String(name)) => Some(name),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

fn string_entries(entries: Option<Vec<Value>>) -> Vec<String> {
    entries
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| match entry {
            Value::String(value) => Some(value),
            _ => None,
        })
        .collect()
}

/// Extract a [`Release`] from a release detail payload
///
/// # Errors
///
/// Returns [`MetadataError::Decode`] if the payload is not a JSON object,
/// lacks an integral `id`, or has a list field that is not an array.
pub fn extract_release(payload: &[u8]) -> Result<Release> {
    let document: ReleaseDocument = decode_object(payload, "release document")?;

    Ok(Release::new(
        document.id,
        artist_names(document.artists),
        string_entries(document.styles),
        string_entries(document.genres),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_full_document() {
        let payload = br#"{
            "id": 42,
            "title": "Selected Ambient Works",
            "artists": [{"name": "Aphex Twin", "id": 45}],
            "styles": ["Ambient", "IDM"],
            "genres": ["Electronic"]
        }"#;

        let release = extract_release(payload).unwrap();

        assert_eq!(release.id(), 42);
        assert_eq!(release.artists(), ["Aphex Twin"]);
        assert_eq!(release.styles(), ["Ambient", "IDM"]);
        assert_eq!(release.genres(), ["Electronic"]);
    }

    #[test]
    fn test_integral_float_id_is_accepted() {
        let release = extract_release(br#"{"id": 42.0, "genres": ["Jazz"]}"#).unwrap();
        assert_eq!(release.id(), 42);
        assert_eq!(release.genres(), ["Jazz"]);

        let release = extract_release(br#"{"id": -3.0}"#).unwrap();
        assert_eq!(release.id(), -3);
    }

    #[test]
    fn test_out_of_range_id_is_rejected() {
        let result = extract_release(br#"{"id": 1e300}"#);
        assert!(matches!(result, Err(MetadataError::Decode { .. })));

        let result = extract_release(br#"{"id": 18446744073709551615}"#);
        assert!(matches!(result, Err(MetadataError::Decode { .. })));
    }

    #[test]
    fn test_decode_object_rejects_arrays() {
        let result = decode_object::<ReleaseDocument>(b"[42]", "release document");
        assert!(matches!(result, Err(MetadataError::Decode { .. })));
    }
}
