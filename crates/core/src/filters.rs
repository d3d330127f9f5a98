//! Per-stream filters and their serialization into filter-graph flags.

use indexmap::IndexMap;

/// Filters for one stream keyed by name, last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCollection {
    filters: IndexMap<String, Option<String>>,
}

impl FilterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a filter, replacing any earlier value under the same name
    /// without moving it.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let value = value.into().trim().to_string();
        let value = (!value.is_empty()).then_some(value);
        self.filters.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.filters.get(name).and_then(|v| v.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.filters
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// The flag a group of filters is emitted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterCategory {
    Complex,
    Audio,
    Video,
}

impl FilterCategory {
    pub fn flag(&self) -> &'static str {
        match self {
            Self::Complex => "-filter_complex",
            Self::Audio => "-filter:a",
            Self::Video => "-filter:v",
        }
    }
}

/// One stream's filters, tagged with the category and stream index they
/// render under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfiguration {
    pub category: FilterCategory,
    pub stream_index: usize,
    pub filters: FilterCollection,
}

/// Renders filter configurations into `-flag "..."` tokens.
///
/// Configurations are grouped by category in first-seen order. Every filter
/// becomes `[index] name=value` (or `[index] name`) and all entries of a
/// category are joined with `;`. Empty configurations contribute nothing.
pub fn render_filter_graph(configurations: &[FilterConfiguration]) -> Vec<String> {
    let mut groups: IndexMap<FilterCategory, Vec<String>> = IndexMap::new();

    for configuration in configurations {
        if configuration.filters.is_empty() {
            continue;
        }

        let entries = groups.entry(configuration.category).or_default();
        for (name, value) in configuration.filters.iter() {
            let entry = match value {
                Some(value) => format!("[{}] {}={}", configuration.stream_index, name, value),
                None => format!("[{}] {}", configuration.stream_index, name),
            };
            entries.push(entry);
        }
    }

    groups
        .into_iter()
        .map(|(category, entries)| format!("{} \"{}\"", category.flag(), entries.join(";")))
        .collect()
}
