use crate::{
    ChangeDetector, DefaultResolver, LastUsedReloader, ListViewId, OwnerId, SavedSearchEntry,
    SavedSearchError, StartupPhase, UserPreferenceRecord,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperationStatus {
    Idle,
    Running,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SaveOptions {
    pub is_default: bool,
    pub capture_current_tree: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SavedSearchListing {
    pub name: String,
    pub entry: SavedSearchEntry,
    pub selected: bool,
}

/// Saved-search state of one mounted list view.
#[derive(Clone, Debug)]
pub struct SavedSearchState {
    pub list_view: ListViewId,
    pub owner_id: OwnerId,
    pub phase: StartupPhase,
    pub record: Option<UserPreferenceRecord>,
    pub fetch_status: OperationStatus,
    pub mutation_status: OperationStatus,
    pub selected: Option<String>,
    pub last_error: Option<SavedSearchError>,
    pub(crate) initial_fetch_done: bool,
    /// Bumped on every successful save; fetches stamped with an older value are stale.
    pub(crate) fetch_generation: u64,
    pub(crate) unmounted: bool,
    pub(crate) reloader: LastUsedReloader,
    pub(crate) resolver: DefaultResolver,
    pub(crate) detector: ChangeDetector,
}

impl SavedSearchState {
    pub fn new(list_view: ListViewId, owner_id: OwnerId, wants_last_used: bool) -> Self {
        Self {
            list_view,
            owner_id,
            phase: StartupPhase::Uninitialized,
            record: None,
            fetch_status: OperationStatus::Idle,
            mutation_status: OperationStatus::Idle,
            selected: None,
            last_error: None,
            initial_fetch_done: false,
            fetch_generation: 0,
            unmounted: false,
            reloader: LastUsedReloader::new(wants_last_used),
            resolver: DefaultResolver::new(),
            detector: ChangeDetector::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        !self.initial_fetch_done
    }

    pub fn is_available(&self) -> bool {
        self.record.is_some()
    }

    pub fn is_unmounted(&self) -> bool {
        self.unmounted
    }

    pub fn mutation_in_flight(&self) -> bool {
        self.mutation_status == OperationStatus::Running
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.selected.is_some() && self.detector.has_unsaved_changes()
    }

    pub fn entry(&self, name: &str) -> Option<&SavedSearchEntry> {
        self.record
            .as_ref()?
            .saved_searches
            .entry(&self.list_view, name)
    }

    pub fn selected_entry(&self) -> Option<(&str, &SavedSearchEntry)> {
        let name = self.selected.as_deref()?;
        Some((name, self.entry(name)?))
    }

    pub fn fetch_generation(&self) -> u64 {
        self.fetch_generation
    }

    pub fn list_entries(&self) -> Vec<SavedSearchListing> {
        let Some(record) = self.record.as_ref() else {
            return Vec::new();
        };
        record
            .saved_searches
            .entries(&self.list_view)
            .map(|(name, entry)| SavedSearchListing {
                name: name.to_owned(),
                entry: entry.clone(),
                selected: self.selected.as_deref() == Some(name),
            })
            .collect()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }
}
