use crate::{OwnerId, SerializedTree, UserPreferenceRecord};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PendingMutation {
    Upsert { name: String },
    Delete { name: String },
}

impl PendingMutation {
    pub fn name(&self) -> &str {
        match self {
            PendingMutation::Upsert { name } | PendingMutation::Delete { name } => name,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Effect {
    ReadLastUsedTree {
        key: String,
    },
    WriteLastUsedTree {
        key: String,
        tree: SerializedTree,
    },

    ApplyTreeToEditor {
        tree: SerializedTree,
        submit: bool,
    },
    SnapshotSelection {
        name: String,
        tree: SerializedTree,
    },

    FetchPreference {
        owner_id: OwnerId,
        generation: u64,
    },
    SavePreference {
        record: Box<UserPreferenceRecord>,
        mutation: PendingMutation,
    },
}
