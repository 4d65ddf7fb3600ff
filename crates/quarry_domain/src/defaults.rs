use crate::{ListViewId, SavedSearchEntry, SavedSearchStore};

/// Picks the default search of a list view the first time a record is available.
#[derive(Clone, Debug, Default)]
pub struct DefaultResolver {
    applied: bool,
}

impl DefaultResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_applied(&self) -> bool {
        self.applied
    }

    /// Marks the resolver as used and returns the default entry, if any. Later calls
    /// return `None` so a refetched record never replaces what the user is editing.
    pub fn resolve<'a>(
        &mut self,
        store: &'a SavedSearchStore,
        list_view: &ListViewId,
    ) -> Option<(&'a str, &'a SavedSearchEntry)> {
        if self.applied {
            return None;
        }
        self.applied = true;
        store.default_entry(list_view)
    }
}
