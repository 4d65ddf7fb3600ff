use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PREFERENCE_RESOURCE_TYPE: &str = "user-preference";
pub const OWNER_FILTER_PARAM: &str = "filter[ownerId]";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedSearchEntryWire {
    #[serde(rename = "default", alias = "isDefault", default)]
    pub is_default: bool,
    #[serde(rename = "queryTree", default)]
    pub query_tree: serde_json::Value,
}

pub type SavedSearchesWire = BTreeMap<String, BTreeMap<String, SavedSearchEntryWire>>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceAttributes {
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    #[serde(rename = "savedSearches", default)]
    pub saved_searches: SavedSearchesWire,
    /// Preference fields this workspace does not own. Sent back verbatim on save.
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreferenceResource {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: PreferenceAttributes,
}

impl PreferenceResource {
    pub fn new(id: Option<String>, attributes: PreferenceAttributes) -> Self {
        Self {
            id,
            kind: PREFERENCE_RESOURCE_TYPE.to_owned(),
            attributes,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreferenceDocument {
    pub data: PreferenceResource,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceCollection {
    #[serde(default)]
    pub data: Vec<PreferenceResource>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupPhase {
    Uninitialized,
    ReloadDecided,
    DefaultResolved,
    Ready,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SavedSearchListingSnapshot {
    pub name: String,
    pub is_default: bool,
    pub selected: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SavedSearchSnapshot {
    pub rev: u64,
    pub list_view: String,
    pub phase: StartupPhase,
    pub loading: bool,
    pub available: bool,
    pub entries: Vec<SavedSearchListingSnapshot>,
    #[serde(default)]
    pub selected_name: Option<String>,
    #[serde(default)]
    pub selected_is_default: bool,
    pub has_unsaved_changes: bool,
    pub mutation_in_flight: bool,
    #[serde(default)]
    pub last_error: Option<String>,
}
