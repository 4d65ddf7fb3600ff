use crate::{SaveOptions, SavedSearchError};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SaveSearchDialogMode {
    Create,
    /// Saves the live tree over the currently selected search.
    Overwrite { name: String },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DialogError {
    EmptyName,
    /// The name exists already; the user has to confirm the overwrite first.
    NameTaken { name: String },
    AlreadySubmitting,
}

impl std::fmt::Display for DialogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialogError::EmptyName => write!(f, "a saved search needs a name"),
            DialogError::NameTaken { name } => {
                write!(f, "a saved search named {name:?} already exists")
            }
            DialogError::AlreadySubmitting => write!(f, "the saved search is still being saved"),
        }
    }
}

impl std::error::Error for DialogError {}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaveSearchRequest {
    pub name: String,
    pub options: SaveOptions,
}

/// Form state of the create/overwrite dialog.
#[derive(Clone, Debug)]
pub struct SaveSearchDialog {
    pub mode: SaveSearchDialogMode,
    pub name: String,
    pub set_as_default: bool,
    pub overwrite_confirmed: bool,
    pub submitting: bool,
    pub error: Option<String>,
}

impl SaveSearchDialog {
    pub fn create() -> Self {
        Self {
            mode: SaveSearchDialogMode::Create,
            name: String::new(),
            set_as_default: false,
            overwrite_confirmed: false,
            submitting: false,
            error: None,
        }
    }

    pub fn overwrite(name: impl Into<String>, is_default: bool) -> Self {
        let name = name.into();
        Self {
            mode: SaveSearchDialogMode::Overwrite { name: name.clone() },
            name,
            set_as_default: is_default,
            overwrite_confirmed: true,
            submitting: false,
            error: None,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        if matches!(self.mode, SaveSearchDialogMode::Overwrite { .. }) {
            return;
        }
        self.name = name.into();
        self.overwrite_confirmed = false;
        self.error = None;
    }

    pub fn set_default(&mut self, set_as_default: bool) {
        self.set_as_default = set_as_default;
    }

    pub fn confirm_overwrite(&mut self) {
        self.overwrite_confirmed = true;
        self.error = None;
    }

    pub fn submit(&mut self, existing_names: &[String]) -> Result<SaveSearchRequest, DialogError> {
        let result = self.validate(existing_names);
        match &result {
            Ok(_) => {
                self.submitting = true;
                self.error = None;
            }
            Err(DialogError::AlreadySubmitting) => {}
            Err(err) => self.error = Some(err.to_string()),
        }
        result
    }

    fn validate(&self, existing_names: &[String]) -> Result<SaveSearchRequest, DialogError> {
        if self.submitting {
            return Err(DialogError::AlreadySubmitting);
        }
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DialogError::EmptyName);
        }
        let taken = existing_names.iter().any(|existing| existing == name);
        if taken && !self.overwrite_confirmed {
            return Err(DialogError::NameTaken {
                name: name.to_owned(),
            });
        }
        Ok(SaveSearchRequest {
            name: name.to_owned(),
            options: SaveOptions {
                is_default: self.set_as_default,
                capture_current_tree: true,
            },
        })
    }

    /// Applies the outcome of the save. Returns `true` when the dialog should close.
    pub fn finish(&mut self, result: Result<(), SavedSearchError>) -> bool {
        self.submitting = false;
        match result {
            Ok(()) => {
                self.error = None;
                true
            }
            Err(err) => {
                self.error = Some(err.to_string());
                false
            }
        }
    }
}
