use crate::{SerializedTree, parse_cached_tree};

#[derive(Clone, Debug, PartialEq)]
pub enum ReloadDecision {
    Hydrate(SerializedTree),
    Skip,
}

/// Decides, once per mount, whether the editor starts from the cached last-used tree.
#[derive(Clone, Debug)]
pub struct LastUsedReloader {
    wants_last_used: bool,
    hydrated: Option<bool>,
}

impl LastUsedReloader {
    pub fn new(wants_last_used: bool) -> Self {
        Self {
            wants_last_used,
            hydrated: None,
        }
    }

    pub fn wants_last_used(&self) -> bool {
        self.wants_last_used
    }

    pub fn is_decided(&self) -> bool {
        self.hydrated.is_some()
    }

    pub fn hydrated(&self) -> bool {
        self.hydrated == Some(true)
    }

    /// Returns `None` once a decision was already made.
    pub fn decide(&mut self, cached: Option<SerializedTree>) -> Option<ReloadDecision> {
        if self.hydrated.is_some() {
            return None;
        }
        let decision = match cached {
            Some(tree) if self.wants_last_used => ReloadDecision::Hydrate(tree),
            _ => ReloadDecision::Skip,
        };
        self.hydrated = Some(matches!(decision, ReloadDecision::Hydrate(_)));
        Some(decision)
    }
}

/// Turns a raw cache value into a tree usable for reloading. Unparseable or
/// incompatible values are a miss.
pub fn cached_tree_for_reload(
    raw: Option<&str>,
    is_compatible: impl Fn(&SerializedTree) -> bool,
) -> Option<SerializedTree> {
    parse_cached_tree(raw?).filter(|tree| is_compatible(tree))
}
