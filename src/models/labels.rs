use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Case folding used for every label and description comparison
pub fn fold(value: &str) -> String {
    value.to_lowercase()
}

/// Case-insensitive ordering, ties broken by the exact text so the order is total
pub fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}

/// Label to description mapping with case-insensitive keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    entries: HashMap<String, String>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mapping, replacing any label that differs only in case
    pub fn insert(&mut self, label: &str, description: &str) {
        self.entries.insert(fold(label), description.to_string());
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.get(&fold(label)).map(String::as_str)
    }
}

impl From<&BTreeMap<String, String>> for LabelMap {
    fn from(map: &BTreeMap<String, String>) -> Self {
        let mut labels = LabelMap::new();
        for (label, description) in map {
            labels.insert(label, description);
        }
        labels
    }
}
