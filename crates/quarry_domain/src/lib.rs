mod ids;
pub use ids::{ListViewId, OwnerId, PreferenceId};

mod tree;
pub use tree::{SerializedTree, parse_cached_tree};

mod store;
pub use store::{ListViewSearches, SavedSearchEntry, SavedSearchStore};

mod record;
pub use record::UserPreferenceRecord;

mod adapters;
pub use adapters::{
    LAST_USED_TREE_KEY_SUFFIX, LocalCache, PreferenceGateway, QueryTreeEditor,
    last_used_tree_key,
};

mod url_signal;
pub use url_signal::{RELOAD_LAST_SEARCH_PARAM, wants_last_used};

mod reload;
pub use reload::{LastUsedReloader, ReloadDecision, cached_tree_for_reload};

mod defaults;
pub use defaults::DefaultResolver;

mod change_detector;
pub use change_detector::ChangeDetector;

mod startup;
pub use startup::StartupPhase;

mod error;
pub use error::SavedSearchError;

mod actions;
pub use actions::Action;
mod effects;
pub use effects::{Effect, PendingMutation};

mod dialog;
pub use dialog::{DialogError, SaveSearchDialog, SaveSearchDialogMode, SaveSearchRequest};

mod state;
pub use state::{OperationStatus, SaveOptions, SavedSearchListing, SavedSearchState};

mod reducer;
