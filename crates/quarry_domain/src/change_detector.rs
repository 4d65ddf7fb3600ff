/// Compares canonical strings of the selected search and the live tree.
///
/// The selected side is set once per selection; the live side on every edit, so
/// typing only costs one canonicalization of the live tree.
#[derive(Clone, Debug, Default)]
pub struct ChangeDetector {
    selected: Option<String>,
    live: String,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_selected(&mut self, canonical: String) {
        self.selected = Some(canonical);
    }

    pub fn clear_selected(&mut self) {
        self.selected = None;
    }

    pub fn observe_live(&mut self, canonical: String) {
        self.live = canonical;
    }

    pub fn has_unsaved_changes(&self) -> bool {
        match &self.selected {
            Some(selected) => *selected != self.live,
            None => false,
        }
    }
}
