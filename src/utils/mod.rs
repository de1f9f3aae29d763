//! Project-specific utilities live here.
//!
//! Book payloads arrive from forms and hand-edited JSON files, so numeric
//! fields are read leniently: numbers and numeric strings are accepted and
//! anything else becomes "absent" instead of failing the whole payload.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce a JSON value into an integer, if it plausibly is one.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

/// Integer at the start of `s`, ignoring anything after it (`"5 estrelas"` is 5).
pub fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let digits_from = usize::from(s.starts_with(['-', '+']));
    let end = s[digits_from..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(s.len(), |i| i + digits_from);
    if end == digits_from {
        return None;
    }
    s[..end].parse().ok()
}

/// `deserialize_with` for `Option<T>` integer fields.
///
/// Values that are not integers, or do not fit `T`, deserialize as `None`.
pub fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(coerce_int)
        .and_then(|n| T::try_from(n).ok()))
}

/// `deserialize_with` for patch fields of shape `Option<Option<i64>>`.
///
/// Pair with `#[serde(default)]`: a missing key stays `None` (leave unchanged),
/// `null` becomes `Some(None)` (clear), and a non-numeric value is ignored.
pub fn lenient_patch_number<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => Some(None),
        other => coerce_int(&other).map(Some),
    })
}

/// `deserialize_with` that distinguishes an explicit `null` from a missing key.
///
/// Pair with `#[serde(default)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "lenient_number")]
        year: Option<i32>,
        #[serde(default, deserialize_with = "lenient_number")]
        pages: Option<u32>,
    }

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "lenient_patch_number")]
        year: Option<Option<i64>>,
        #[serde(default, deserialize_with = "nullable")]
        notes: Option<Option<String>>,
    }

    #[test]
    fn coerce_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_int(&json!(1965)), Some(1965));
        assert_eq!(coerce_int(&json!(" 1965 ")), Some(1965));
        assert_eq!(coerce_int(&json!(4.0)), Some(4));
        assert_eq!(coerce_int(&json!("4.5")), Some(4));
        assert_eq!(coerce_int(&json!("sixties")), None);
        assert_eq!(coerce_int(&json!(true)), None);
        assert_eq!(coerce_int(&json!([1])), None);
    }

    #[test]
    fn leading_int_reads_the_numeric_prefix() {
        assert_eq!(leading_int("5 estrelas"), Some(5));
        assert_eq!(leading_int(" 4.5"), Some(4));
        assert_eq!(leading_int("-3x"), Some(-3));
        assert_eq!(leading_int("cinco"), None);
        assert_eq!(leading_int("-"), None);
        assert_eq!(leading_int(""), None);
    }

    #[test]
    fn malformed_numbers_become_absent() {
        let form: Form = serde_json::from_value(json!({"year": "abc", "pages": -10})).unwrap();
        assert_eq!(form.year, None);
        assert_eq!(form.pages, None);

        let form: Form = serde_json::from_value(json!({"year": "2003", "pages": 454})).unwrap();
        assert_eq!(form.year, Some(2003));
        assert_eq!(form.pages, Some(454));

        let form: Form = serde_json::from_value(json!({})).unwrap();
        assert_eq!(form.year, None);
    }

    #[test]
    fn patch_fields_distinguish_missing_null_and_value() {
        let patch: Patch = serde_json::from_value(json!({})).unwrap();
        assert_eq!(patch.year, None);
        assert_eq!(patch.notes, None);

        let patch: Patch = serde_json::from_value(json!({"year": null, "notes": null})).unwrap();
        assert_eq!(patch.year, Some(None));
        assert_eq!(patch.notes, Some(None));

        let patch: Patch =
            serde_json::from_value(json!({"year": "1997", "notes": "reler"})).unwrap();
        assert_eq!(patch.year, Some(Some(1997)));
        assert_eq!(patch.notes, Some(Some("reler".to_string())));

        let patch: Patch = serde_json::from_value(json!({"year": "soon"})).unwrap();
        assert_eq!(patch.year, None);
    }
}
