//! Ordered form fields of a feedback report

use indexmap::IndexMap;
use url::form_urlencoded;

/// Ordered mapping of form field names to optional values.
///
/// Field order is the order of first insertion. Re-inserting a key
/// replaces the value but keeps the original position.
#[derive(Debug, Clone, Default)]
pub struct FeedbackParameters {
    fields: IndexMap<String, Option<String>>,
}

impl FeedbackParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, returning the previous value if the key existed
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: Option<String>,
    ) -> Option<Option<String>> {
        self.fields.insert(key.into(), value)
    }

    /// Builder-style insert of a present value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, Some(value.into()));
        self
    }

    /// Look up a field. `None` if absent, `Some(None)` if present without a value.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.fields.get(key).map(|v| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Encode as `application/x-www-form-urlencoded`.
    /// Fields without a value are sent with an empty value.
    pub fn to_form_body(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.fields {
            serializer.append_pair(key, value.as_deref().unwrap_or(""));
        }
        serializer.finish()
    }
}

// IndexMap equality ignores order; field order is part of the payload here
impl PartialEq for FeedbackParameters {
    fn eq(&self, other: &Self) -> bool {
        self.fields.iter().eq(other.fields.iter())
    }
}

impl Eq for FeedbackParameters {}

impl<K, V> FromIterator<(K, Option<V>)> for FeedbackParameters
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        let mut params = FeedbackParameters::new();
        for (key, value) in iter {
            params.insert(key, value.map(Into::into));
        }
        params
    }
}
