use crate::{ListViewId, SerializedTree};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedSearchEntry {
    pub is_default: bool,
    pub query_tree: SerializedTree,
}

pub type ListViewSearches = BTreeMap<String, SavedSearchEntry>;

/// Named searches of every list view, as persisted inside the preference record.
///
/// Maps are ordered, so listings come back sorted by name no matter how the
/// entries were inserted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedSearchStore(pub BTreeMap<ListViewId, ListViewSearches>);

impl SavedSearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_view(&self, list_view: &ListViewId) -> Option<&ListViewSearches> {
        self.0.get(list_view)
    }

    pub fn entry(&self, list_view: &ListViewId, name: &str) -> Option<&SavedSearchEntry> {
        self.0.get(list_view)?.get(name)
    }

    pub fn contains(&self, list_view: &ListViewId, name: &str) -> bool {
        self.entry(list_view, name).is_some()
    }

    pub fn entries<'a>(
        &'a self,
        list_view: &ListViewId,
    ) -> impl Iterator<Item = (&'a str, &'a SavedSearchEntry)> + 'a {
        self.0
            .get(list_view)
            .into_iter()
            .flat_map(|searches| searches.iter().map(|(name, entry)| (name.as_str(), entry)))
    }

    pub fn names(&self, list_view: &ListViewId) -> Vec<String> {
        self.entries(list_view)
            .map(|(name, _)| name.to_owned())
            .collect()
    }

    pub fn default_entry(&self, list_view: &ListViewId) -> Option<(&str, &SavedSearchEntry)> {
        self.entries(list_view).find(|(_, entry)| entry.is_default)
    }

    /// Inserts or overwrites `name`. With `tree == None` the stored tree of an existing
    /// entry is kept; returns `false` when there is nothing to keep.
    pub fn upsert(
        &mut self,
        list_view: &ListViewId,
        name: &str,
        is_default: bool,
        tree: Option<SerializedTree>,
    ) -> bool {
        let query_tree = match tree {
            Some(tree) => tree,
            None => match self.entry(list_view, name) {
                Some(existing) => existing.query_tree.clone(),
                None => return false,
            },
        };

        let searches = self.0.entry(list_view.clone()).or_default();
        if is_default {
            for (other_name, entry) in searches.iter_mut() {
                if other_name != name {
                    entry.is_default = false;
                }
            }
        }

        searches.insert(
            name.to_owned(),
            SavedSearchEntry {
                is_default,
                query_tree,
            },
        );
        true
    }

    pub fn remove(&mut self, list_view: &ListViewId, name: &str) -> Option<SavedSearchEntry> {
        let searches = self.0.get_mut(list_view)?;
        let removed = searches.remove(name);
        if searches.is_empty() {
            self.0.remove(list_view);
        }
        removed
    }

    pub fn default_count(&self, list_view: &ListViewId) -> usize {
        self.entries(list_view)
            .filter(|(_, entry)| entry.is_default)
            .count()
    }
}
