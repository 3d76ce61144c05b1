//! Parameter bags
//!
//! Three bag types flow through the engine:
//!
//! - [`Params`]: what a caller asks for. Values may be literals, derivations
//!   of the previous value, or asynchronous producers.
//! - [`Patch`]: a resolved partial update with concrete values only.
//! - [`State`]: the cumulative merge of every patch applied to an entity.
//!
//! All three keep insertion order.

use std::fmt;
use std::sync::Arc;

use futures::stream::{BoxStream, Stream, StreamExt};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{NachtError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Resolved bags
// ─────────────────────────────────────────────────────────────────────────────

/// A resolved partial update: concrete values applied atomically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch(IndexMap<String, Value>);

impl Patch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a patch carrying a single key.
    pub fn single(key: impl Into<String>, value: Value) -> Self {
        let mut patch = Self::new();
        patch.insert(key, value);
        patch
    }

    /// Insert or overwrite a key (builder pattern).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value.into());
        self
    }

    /// Insert or overwrite a key.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Get the value for a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Check whether the patch touches a key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of keys in the patch.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the patch carries no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Patch {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Patch {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// The cumulative logical state of an entity.
///
/// Merging is key-wise overwrite: the most recent value for a key wins and
/// keys never disappear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(IndexMap<String, Value>);

impl State {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a patch into this state, overwriting keys it touches.
    pub fn merge(&mut self, patch: &Patch) {
        for (key, value) in patch.iter() {
            self.0.insert(key.to_string(), value.clone());
        }
    }

    /// Merge another state on top of this one.
    pub fn merge_state(&mut self, other: &State) {
        for (key, value) in other.iter() {
            self.0.insert(key.to_string(), value.clone());
        }
    }

    /// Insert or overwrite a key (builder pattern).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Get the value for a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a string-valued key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the state holds no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert into a JSON object.
    pub fn into_value(self) -> Value {
        Value::Object(self.0.into_iter().collect::<Map<String, Value>>())
    }

    /// Build a state from a JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map.into_iter().collect())),
            other => Err(NachtError::invalid(format!(
                "expected a params object, got {}",
                value_type_name(&other)
            ))),
        }
    }
}

impl From<Patch> for State {
    fn from(patch: Patch) -> Self {
        Self(patch.into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for State {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Short JSON type name for error messages.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Requested values
// ─────────────────────────────────────────────────────────────────────────────

type DeriveFn = dyn Fn(Option<&Value>) -> std::result::Result<Value, String> + Send + Sync;

/// A pure function computing a key's new value from its previous value.
///
/// The previous value is `None` when the key has never been set.
#[derive(Clone)]
pub struct Derivation(Arc<DeriveFn>);

impl Derivation {
    /// Wrap an infallible derivation.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(
            move |prev: Option<&Value>| -> std::result::Result<Value, String> { Ok(f(prev)) },
        ))
    }

    /// Wrap a derivation that can fail with a message.
    pub fn fallible<F, E>(f: F) -> Self
    where
        F: Fn(Option<&Value>) -> std::result::Result<Value, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        Self(Arc::new(
            move |prev: Option<&Value>| -> std::result::Result<Value, String> {
                f(prev).map_err(|e| e.to_string())
            },
        ))
    }

    /// Run the derivation against a previous value.
    pub fn derive(&self, previous: Option<&Value>) -> std::result::Result<Value, String> {
        (self.0)(previous)
    }
}

impl fmt::Debug for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Derivation(..)")
    }
}

/// An asynchronous source of successive values for one key.
pub struct Producer(BoxStream<'static, std::result::Result<Value, String>>);

impl Producer {
    /// Wrap an infallible stream of values.
    pub fn new<S, T>(stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
        T: Into<Value>,
    {
        Self(stream.map(|v| Ok(v.into())).boxed())
    }

    /// Wrap a stream whose items may fail.
    pub fn fallible<S, T, E>(stream: S) -> Self
    where
        S: Stream<Item = std::result::Result<T, E>> + Send + 'static,
        T: Into<Value>,
        E: fmt::Display,
    {
        Self(
            stream
                .map(|item| item.map(Into::into).map_err(|e| e.to_string()))
                .boxed(),
        )
    }

    /// Build a producer from a fixed list of values.
    pub fn from_values<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
        T: Into<Value> + Send + 'static,
    {
        Self::new(futures::stream::iter(values))
    }

    pub(crate) fn into_inner(self) -> BoxStream<'static, std::result::Result<Value, String>> {
        self.0
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Producer(..)")
    }
}

/// One requested value.
#[derive(Debug)]
pub enum ParamValue {
    /// A concrete value
    Literal(Value),
    /// A function of the previous value
    Derive(Derivation),
    /// A stream of replacement values over time
    Stream(Producer),
}

impl ParamValue {
    /// Wrap an infallible derivation.
    pub fn derive<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>) -> Value + Send + Sync + 'static,
    {
        Self::Derive(Derivation::new(f))
    }

    /// Wrap an infallible stream.
    pub fn stream<S, T>(stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
        T: Into<Value>,
    {
        Self::Stream(Producer::new(stream))
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<Derivation> for ParamValue {
    fn from(derivation: Derivation) -> Self {
        Self::Derive(derivation)
    }
}

impl From<Producer> for ParamValue {
    fn from(producer: Producer) -> Self {
        Self::Stream(producer)
    }
}

impl From<State> for ParamValue {
    fn from(state: State) -> Self {
        Self::Literal(state.into_value())
    }
}

macro_rules! literal_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    Self::Literal(Value::from(value))
                }
            }
        )*
    };
}

literal_from!(bool, i32, i64, u32, u64, f32, f64, String, &str, Vec<Value>);

impl From<[f64; 3]> for ParamValue {
    fn from(value: [f64; 3]) -> Self {
        Self::Literal(Value::from(value.to_vec()))
    }
}

/// A requested update: ordered map from key to requested value.
#[derive(Debug, Default)]
pub struct Params(IndexMap<String, ParamValue>);

impl Params {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key to any requested value (builder pattern).
    pub fn set(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Set a key to a derivation of its previous value (builder pattern).
    pub fn derive<F>(self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(Option<&Value>) -> Value + Send + Sync + 'static,
    {
        self.set(key, ParamValue::derive(f))
    }

    /// Feed a key from an asynchronous stream (builder pattern).
    pub fn stream<S, T>(self, key: impl Into<String>, stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
        T: Into<Value>,
    {
        self.set(key, ParamValue::stream(stream))
    }

    /// Insert or overwrite a key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Get the requested value for a key.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// Iterate over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of requested keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if nothing is requested.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert to a concrete patch if every value is a literal.
    pub fn into_literal_patch(self) -> Result<Patch> {
        self.0
            .into_iter()
            .map(|(key, value)| match value {
                ParamValue::Literal(v) => Ok((key, v)),
                ParamValue::Derive(_) | ParamValue::Stream(_) => Err(NachtError::invalid(
                    format!("'{key}' is not a literal value"),
                )),
            })
            .collect()
    }

    /// Build a request from a JSON object of literals.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(State::from_value(value)?.into())
    }
}

impl IntoIterator for Params {
    type Item = (String, ParamValue);
    type IntoIter = indexmap::map::IntoIter<String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<State> for Params {
    fn from(state: State) -> Self {
        Self(
            state
                .0
                .into_iter()
                .map(|(k, v)| (k, ParamValue::Literal(v)))
                .collect(),
        )
    }
}

impl From<Patch> for Params {
    fn from(patch: Patch) -> Self {
        State::from(patch).into()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
