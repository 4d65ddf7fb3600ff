#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SavedSearchError {
    FetchFailed { message: String },
    SaveFailed { name: String, message: String },
    MutationInFlight,
    Unavailable,
    UnknownSearch { name: String },
}

impl std::fmt::Display for SavedSearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FetchFailed { message } => {
                write!(f, "failed to retrieve saved searches: {message}")
            }
            Self::SaveFailed { name, message } => {
                write!(f, "failed to save saved search {name:?}: {message}")
            }
            Self::MutationInFlight => write!(f, "another saved search change is still in progress"),
            Self::Unavailable => write!(f, "saved searches are unavailable"),
            Self::UnknownSearch { name } => write!(f, "saved search {name:?} does not exist"),
        }
    }
}

impl std::error::Error for SavedSearchError {}
