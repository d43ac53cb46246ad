use std::collections::HashMap;

use bimap::BiMap;

/// Hands out SAP style element ids (`CallActivity_1`, `SequenceFlow_4`, ...).
///
/// Counters are kept per prefix and start at 1, so the same metadata always
/// produces the same ids.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    counters: HashMap<String, usize>,
}

impl IdAllocator {
    pub fn new() -> Self {
        IdAllocator { counters: HashMap::new() }
    }

    pub fn next(&mut self, prefix: &str) -> String {
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        format!("{}_{}", prefix, counter)
    }
}

/// Two way mapping between ids used in the metadata JSON and generated element ids.
#[derive(Debug, Clone, Default)]
pub struct IdRegistry {
    ids: BiMap<String, String>,
}

impl IdRegistry {
    pub fn new() -> Self {
        IdRegistry { ids: BiMap::new() }
    }

    /// Returns `false` when the metadata id is already registered.
    pub fn register(&mut self, metadata_id: &str, element_id: &str) -> bool {
        if self.ids.contains_left(metadata_id) {
            return false;
        }
        self.ids.insert(metadata_id.to_string(), element_id.to_string());
        true
    }

    pub fn element_id(&self, metadata_id: &str) -> Option<&str> {
        self.ids.get_by_left(metadata_id).map(String::as_str)
    }

    pub fn metadata_id(&self, element_id: &str) -> Option<&str> {
        self.ids.get_by_right(element_id).map(String::as_str)
    }

    pub fn contains(&self, metadata_id: &str) -> bool {
        self.ids.contains_left(metadata_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Turns a display name into an artifact id: `[A-Za-z0-9_]` only, never
/// starting with a digit.
pub fn sanitize_id(raw: &str) -> String {
    let mut id: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    while id.contains("__") {
        id = id.replace("__", "_");
    }
    let id = id.trim_matches('_').to_string();

    match id.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("IFlow_{}", id),
        _ => id,
    }
}

/// Turns a metadata name into a resource file stem (`Map Orders` -> `Map_Orders`).
pub fn sanitize_file_stem(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' { c } else { '_' })
        .collect()
}
