use crate::{OwnerId, PreferenceId, SavedSearchStore};

/// The per-user preference document. Saved searches are one field of it; the rest
/// travels in `other` and is written back unchanged.
///
/// The server has no partial update and no revision token: every save replaces the
/// whole document, so two sessions saving from stale copies lose one of the writes.
#[derive(Clone, Debug, PartialEq)]
pub struct UserPreferenceRecord {
    pub id: Option<PreferenceId>,
    pub owner_id: OwnerId,
    pub saved_searches: SavedSearchStore,
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl UserPreferenceRecord {
    /// Record for a user who never saved preferences. The server assigns an id on first save.
    pub fn unsaved(owner_id: OwnerId) -> Self {
        Self {
            id: None,
            owner_id,
            saved_searches: SavedSearchStore::new(),
            other: serde_json::Map::new(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
