use crate::{PendingMutation, SerializedTree, UserPreferenceRecord};

#[derive(Clone, Debug)]
pub enum Action {
    Mounted,
    Unmounted,

    LastUsedTreeRead {
        tree: Option<SerializedTree>,
    },

    LoadRequested,
    /// `generation` echoes the one stamped on the `FetchPreference` effect.
    PreferenceLoaded {
        generation: u64,
        record: Option<Box<UserPreferenceRecord>>,
    },
    PreferenceLoadFailed {
        generation: u64,
        message: String,
    },

    SelectRequested {
        name: String,
    },
    SelectionSnapshotted {
        name: String,
        canonical: String,
    },
    LiveTreeChanged {
        tree: SerializedTree,
        canonical: String,
    },

    SaveSearchRequested {
        name: String,
        is_default: bool,
        tree: Option<SerializedTree>,
    },
    DeleteSearchRequested {
        name: String,
    },
    PreferenceSaved {
        record: Box<UserPreferenceRecord>,
        mutation: PendingMutation,
    },
    PreferenceSaveFailed {
        mutation: PendingMutation,
        message: String,
    },
}
