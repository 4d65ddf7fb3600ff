use crate::{ListViewId, OwnerId, SerializedTree, UserPreferenceRecord};

pub const LAST_USED_TREE_KEY_SUFFIX: &str = "-last-used-tree";

pub fn last_used_tree_key(list_view: &ListViewId) -> String {
    format!("{}{LAST_USED_TREE_KEY_SUFFIX}", list_view.as_str())
}

/// Remote storage of the preference record. Calls block; the engine runs them off its task.
pub trait PreferenceGateway: Send + Sync {
    /// `Ok(None)` means the user has no record yet.
    fn fetch_preference(&self, owner_id: &OwnerId)
    -> Result<Option<UserPreferenceRecord>, String>;

    /// Replaces the whole record and returns what the server stored.
    fn save_preference(
        &self,
        record: UserPreferenceRecord,
    ) -> Result<UserPreferenceRecord, String>;
}

/// Durable client-side key/value storage.
pub trait LocalCache: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, String>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), String>;
}

/// The live query-tree editor owned by the UI layer.
pub trait QueryTreeEditor: Send + Sync {
    fn current_tree(&self) -> SerializedTree;

    fn replace_tree(&self, tree: SerializedTree);

    /// Structural string form under the editor's current config. Only used for equality.
    fn canonical_string(&self, tree: &SerializedTree) -> String;

    fn is_compatible(&self, tree: &SerializedTree) -> bool {
        let _ = tree;
        true
    }

    /// Runs the list query with the filters currently in the editor.
    fn submit(&self);
}
