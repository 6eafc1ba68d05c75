use crate::{Error, META_KEYS};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::ops::Index;

static NULL: Value = Value::Null;

/// Descriptive metadata of a system.
///
/// Always holds every key in [`META_KEYS`], null unless set. Keys outside
/// that set are kept as given. Values are stored as supplied, so a field
/// holding the wrong kind of value is encoded back unchanged; the typed
/// accessors simply return `None` for it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct Meta(BTreeMap<String, Value>);

impl Default for Meta {
    fn default() -> Self {
        Meta(
            META_KEYS
                .iter()
                .map(|key| (key.to_string(), Value::Null))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, Value>> for Meta {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Meta::from_map(map)
    }
}

/// Conversion into a meta value. Unlike `Into<Value>`, non-finite floats
/// are an error instead of turning into null.
pub trait IntoMetaValue {
    fn into_meta_value(self) -> Result<Value, Error>;
}

impl IntoMetaValue for Value {
    fn into_meta_value(self) -> Result<Value, Error> {
        Ok(self)
    }
}

impl IntoMetaValue for &str {
    fn into_meta_value(self) -> Result<Value, Error> {
        Ok(Value::from(self))
    }
}

impl IntoMetaValue for String {
    fn into_meta_value(self) -> Result<Value, Error> {
        Ok(Value::from(self))
    }
}

impl IntoMetaValue for bool {
    fn into_meta_value(self) -> Result<Value, Error> {
        Ok(Value::from(self))
    }
}

impl IntoMetaValue for i32 {
    fn into_meta_value(self) -> Result<Value, Error> {
        Ok(Value::from(self))
    }
}

impl IntoMetaValue for i64 {
    fn into_meta_value(self) -> Result<Value, Error> {
        Ok(Value::from(self))
    }
}

impl IntoMetaValue for u64 {
    fn into_meta_value(self) -> Result<Value, Error> {
        Ok(Value::from(self))
    }
}

impl IntoMetaValue for f64 {
    fn into_meta_value(self) -> Result<Value, Error> {
        match Number::from_f64(self) {
            Some(number) => Ok(Value::Number(number)),
            None => Err(Error::ValidationError(format!(
                "Meta value {} is not a finite number.",
                self
            ))),
        }
    }
}

impl<T: IntoMetaValue> IntoMetaValue for Option<T> {
    fn into_meta_value(self) -> Result<Value, Error> {
        match self {
            Some(value) => value.into_meta_value(),
            None => Ok(Value::Null),
        }
    }
}

impl Meta {
    /// Builds a meta from an arbitrary map, filling in missing fixed keys.
    pub fn from_map<I, K>(map: I) -> Meta
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut meta = Meta::default();
        for (key, value) in map {
            meta.0.insert(key.into(), value);
        }
        meta
    }

    /// Returns a copy of `self` where every supplied key replaces the current
    /// value, including explicit nulls.
    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Result<Meta, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoMetaValue,
    {
        for (key, value) in overrides {
            self.0.insert(key.into(), value.into_meta_value()?);
        }
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set<K: Into<String>, V: IntoMetaValue>(
        &mut self,
        key: K,
        value: V,
    ) -> Result<Option<Value>, Error> {
        Ok(self.0.insert(key.into(), value.into_meta_value()?))
    }

    /// Fixed keys are reset to null rather than dropped.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        if META_KEYS.contains(&key) {
            return self.0.insert(key.to_string(), Value::Null);
        }
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str)
    }

    pub fn city(&self) -> Option<&str> {
        self.get("city").and_then(Value::as_str)
    }

    pub fn country(&self) -> Option<&str> {
        self.get("country").and_then(Value::as_str)
    }

    pub fn company(&self) -> Option<&str> {
        self.get("company").and_then(Value::as_str)
    }

    pub fn latitude(&self) -> Option<f64> {
        self.get("latitude").and_then(Value::as_f64)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.get("longitude").and_then(Value::as_f64)
    }

    /// Human readable form of a value, `-` when absent.
    pub(crate) fn display(&self, key: &str) -> String {
        match &self[key] {
            Value::Null => String::from("-"),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl Index<&str> for Meta {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&NULL)
    }
}

impl<'a> IntoIterator for &'a Meta {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_has_every_fixed_key_null() {
        let meta = Meta::default();
        assert_eq!(meta.len(), META_KEYS.len());
        for key in META_KEYS.iter() {
            assert_eq!(meta[*key], Value::Null);
        }
    }

    #[test]
    fn overrides_replace_and_extend() {
        let meta = Meta::default().with_overrides(vec![
            ("city", json!("Metropolis")),
            ("system", json!("smartbike")),
        ])
        .unwrap();

        assert_eq!(meta.city(), Some("Metropolis"));
        assert_eq!(meta["system"], "smartbike");
        assert_eq!(meta.len(), META_KEYS.len() + 1);
    }

    #[test]
    fn explicit_null_override_wins() {
        let company = Meta::default()
            .with_overrides(vec![("company", "JCDecaux")])
            .unwrap();
        let meta = company
            .clone()
            .with_overrides(vec![("company", Value::Null)])
            .unwrap();

        assert_eq!(company.company(), Some("JCDecaux"));
        assert_eq!(meta.company(), None);
    }

    #[test]
    fn wrong_types_are_kept_verbatim() {
        let meta = Meta::default()
            .with_overrides(vec![("latitude", json!("41.38"))])
            .unwrap();
        assert_eq!(meta.latitude(), None);
        assert_eq!(meta["latitude"], "41.38");
    }

    #[test]
    fn removing_fixed_key_resets_it() {
        let mut meta = Meta::default();
        meta.set("name", "Bicing").unwrap();
        meta.set("extra", 1).unwrap();

        assert_eq!(meta.remove("name"), Some(json!("Bicing")));
        assert!(meta.contains_key("name"));
        assert_eq!(meta["name"], Value::Null);

        assert_eq!(meta.remove("extra"), Some(json!(1)));
        assert!(!meta.contains_key("extra"));
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        let err = Meta::default()
            .with_overrides(vec![("latitude", f64::NAN)])
            .unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));

        let mut meta = Meta::default();
        assert!(meta.set("longitude", f64::INFINITY).is_err());
        assert_eq!(meta["longitude"], Value::Null);

        meta.set("longitude", 2.17).unwrap();
        assert_eq!(meta.longitude(), Some(2.17));
        meta.set("longitude", None::<f64>).unwrap();
        assert_eq!(meta["longitude"], Value::Null);
    }

    #[test]
    fn from_map_fills_missing_fixed_keys() {
        let meta = Meta::from_map(vec![("city", json!("Paris"))]);
        assert_eq!(meta.city(), Some("Paris"));
        assert_eq!(meta.len(), META_KEYS.len());
    }

    #[test]
    fn missing_keys_read_as_null() {
        assert_eq!(Meta::default()["nope"], Value::Null);
    }

    #[test]
    fn decoding_fills_missing_fixed_keys() {
        let meta: Meta = serde_json::from_value(json!({"city": "Paris", "feed": "gbfs"})).unwrap();
        assert_eq!(meta.city(), Some("Paris"));
        assert_eq!(meta["company"], Value::Null);
        assert_eq!(meta["feed"], "gbfs");
    }
}
