//! Context persistence across list instances.
//!
//! A list that is torn down and rebuilt (tab switch, navigation) can resume
//! where it was. On unmount it saves its offset under `<key>_offset` and,
//! when layouts came from measurements, the layouts under `<key>_layouts` as
//! `{"layoutArray": [...]}`. The next instance built with the same key
//! consumes both entries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::model::Layout;

const OFFSET_SUFFIX: &str = "_offset";
const LAYOUTS_SUFFIX: &str = "_layouts";

/// Key-value storage that outlives list instances.
pub trait ContextStore {
    /// Store `value` under `key`.
    fn save(&mut self, key: &str, value: Value);

    /// Value stored under `key`.
    fn get(&self, key: &str) -> Option<Value>;

    /// Forget `key`.
    fn remove(&mut self, key: &str);
}

/// [`ContextStore`] backed by a hash map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryContextStore {
    entries: HashMap<String, Value>,
}

impl InMemoryContextStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ContextStore for InMemoryContextStore {
    fn save(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LayoutCache {
    #[serde(rename = "layoutArray")]
    layout_array: Vec<Layout>,
}

/// State recovered from a store.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RestoredContext {
    pub(crate) offset: Option<f64>,
    pub(crate) layouts: Option<Vec<Layout>>,
}

/// Consume the saved offset (when positive) and, if asked, the saved layouts.
pub(crate) fn restore(store: &mut dyn ContextStore, unique_key: &str, with_layouts: bool) -> RestoredContext {
    let mut restored = RestoredContext::default();

    let offset_key = format!("{unique_key}{OFFSET_SUFFIX}");
    if let Some(offset) = store.get(&offset_key).and_then(|value| value.as_f64()) {
        if offset > 0.0 {
            restored.offset = Some(offset);
        }
        store.remove(&offset_key);
    }

    if with_layouts {
        let layouts_key = format!("{unique_key}{LAYOUTS_SUFFIX}");
        if let Some(Value::String(raw)) = store.get(&layouts_key) {
            match serde_json::from_str::<LayoutCache>(&raw) {
                Ok(cache) => restored.layouts = Some(cache.layout_array),
                Err(err) => warn!(key = %layouts_key, error = %err, "discarding unreadable layout cache"),
            }
            store.remove(&layouts_key);
        }
    }

    restored
}

/// Save the offset and, when given, the layouts.
pub(crate) fn persist(store: &mut dyn ContextStore, unique_key: &str, offset: f64, layouts: Option<&[Layout]>) {
    store.save(&format!("{unique_key}{OFFSET_SUFFIX}"), Value::from(offset));

    let Some(layouts) = layouts else {
        return;
    };
    let cache = LayoutCache {
        layout_array: layouts.to_vec(),
    };
    match serde_json::to_string(&cache) {
        Ok(raw) => store.save(&format!("{unique_key}{LAYOUTS_SUFFIX}"), Value::String(raw)),
        Err(err) => warn!(key = %unique_key, error = %err, "could not serialize layout cache"),
    }
}
