use crate::{
    Action, Effect, OperationStatus, PendingMutation, ReloadDecision, SavedSearchError,
    SavedSearchState, SerializedTree, StartupPhase, UserPreferenceRecord, last_used_tree_key,
};

impl SavedSearchState {
    pub fn apply(&mut self, action: Action) -> Vec<Effect> {
        if self.unmounted {
            return Vec::new();
        }

        match action {
            Action::Mounted => {
                if self.phase != StartupPhase::Uninitialized {
                    return Vec::new();
                }
                let mut effects = Vec::new();
                if self.reloader.wants_last_used() {
                    effects.push(Effect::ReadLastUsedTree {
                        key: last_used_tree_key(&self.list_view),
                    });
                } else {
                    self.reloader.decide(None);
                    self.phase.advance_to(StartupPhase::ReloadDecided);
                }
                effects.extend(self.start_fetch());
                effects
            }
            Action::Unmounted => {
                self.unmounted = true;
                Vec::new()
            }

            Action::LastUsedTreeRead { tree } => {
                let Some(decision) = self.reloader.decide(tree) else {
                    return Vec::new();
                };
                self.phase.advance_to(StartupPhase::ReloadDecided);

                let mut effects = Vec::new();
                if let ReloadDecision::Hydrate(tree) = decision {
                    effects.push(Effect::ApplyTreeToEditor { tree, submit: true });
                }
                effects.extend(self.resolve_startup_default());
                effects
            }

            Action::LoadRequested => self.start_fetch(),
            Action::PreferenceLoaded { generation, record } => {
                if self.is_stale_fetch(generation) {
                    return Vec::new();
                }
                self.fetch_status = OperationStatus::Idle;
                self.record = Some(match record {
                    Some(record) => *record,
                    None => UserPreferenceRecord::unsaved(self.owner_id.clone()),
                });
                if matches!(self.last_error, Some(SavedSearchError::FetchFailed { .. })) {
                    self.last_error = None;
                }

                if !self.initial_fetch_done {
                    self.initial_fetch_done = true;
                    return self.resolve_startup_default();
                }
                self.reconcile_selection()
            }
            Action::PreferenceLoadFailed {
                generation,
                message,
            } => {
                if self.is_stale_fetch(generation) {
                    return Vec::new();
                }
                self.fetch_status = OperationStatus::Idle;
                self.record = None;
                self.selected = None;
                self.detector.clear_selected();
                self.last_error = Some(SavedSearchError::FetchFailed { message });

                if !self.initial_fetch_done {
                    self.initial_fetch_done = true;
                    return self.resolve_startup_default();
                }
                Vec::new()
            }

            Action::SelectRequested { name } => {
                if self.record.is_none() {
                    self.last_error = Some(SavedSearchError::Unavailable);
                    return Vec::new();
                }
                let Some(entry) = self.entry(&name) else {
                    self.last_error = Some(SavedSearchError::UnknownSearch { name });
                    return Vec::new();
                };
                let tree = entry.query_tree.clone();
                self.select(name, tree)
            }
            Action::SelectionSnapshotted { name, canonical } => {
                if self.selected.as_deref() == Some(name.as_str()) {
                    self.detector.set_selected(canonical);
                }
                if self.phase == StartupPhase::DefaultResolved {
                    self.phase.advance_to(StartupPhase::Ready);
                }
                Vec::new()
            }
            Action::LiveTreeChanged { tree, canonical } => {
                self.detector.observe_live(canonical);
                if !self.phase.reload_decided() {
                    return Vec::new();
                }
                vec![Effect::WriteLastUsedTree {
                    key: last_used_tree_key(&self.list_view),
                    tree,
                }]
            }

            Action::SaveSearchRequested {
                name,
                is_default,
                tree,
            } => {
                let Some(mut next) = self.begin_mutation() else {
                    return Vec::new();
                };
                if !next
                    .saved_searches
                    .upsert(&self.list_view, &name, is_default, tree)
                {
                    self.last_error = Some(SavedSearchError::UnknownSearch { name });
                    return Vec::new();
                }
                self.mutation_status = OperationStatus::Running;
                vec![Effect::SavePreference {
                    record: Box::new(next),
                    mutation: PendingMutation::Upsert { name },
                }]
            }
            Action::DeleteSearchRequested { name } => {
                let Some(mut next) = self.begin_mutation() else {
                    return Vec::new();
                };
                if !next.is_persisted() {
                    tracing::debug!(
                        list_view = %self.list_view,
                        name = %name,
                        "skipping delete: preference record was never saved"
                    );
                    return Vec::new();
                }
                if next.saved_searches.remove(&self.list_view, &name).is_none() {
                    self.last_error = Some(SavedSearchError::UnknownSearch { name });
                    return Vec::new();
                }
                self.mutation_status = OperationStatus::Running;
                vec![Effect::SavePreference {
                    record: Box::new(next),
                    mutation: PendingMutation::Delete { name },
                }]
            }
            Action::PreferenceSaved { record, mutation } => {
                self.mutation_status = OperationStatus::Idle;
                self.record = Some(*record);

                let mut effects = Vec::new();
                match mutation {
                    PendingMutation::Upsert { name } => {
                        if let Some(entry) = self.entry(&name) {
                            let tree = entry.query_tree.clone();
                            self.selected = Some(name.clone());
                            self.detector.clear_selected();
                            effects.push(Effect::SnapshotSelection { name, tree });
                        } else {
                            self.clear_selection();
                        }
                    }
                    PendingMutation::Delete { name } => {
                        if self.selected.as_deref() == Some(name.as_str()) {
                            self.clear_selection();
                        }
                    }
                }
                // A fetch still in flight may predate the save; supersede it.
                self.fetch_generation += 1;
                self.fetch_status = OperationStatus::Idle;
                effects.extend(self.start_fetch());
                effects
            }
            Action::PreferenceSaveFailed { mutation, message } => {
                self.mutation_status = OperationStatus::Idle;
                self.last_error = Some(SavedSearchError::SaveFailed {
                    name: mutation.name().to_owned(),
                    message,
                });
                Vec::new()
            }
        }
    }

    fn start_fetch(&mut self) -> Vec<Effect> {
        if self.fetch_status == OperationStatus::Running {
            return Vec::new();
        }
        self.fetch_status = OperationStatus::Running;
        vec![Effect::FetchPreference {
            owner_id: self.owner_id.clone(),
            generation: self.fetch_generation,
        }]
    }

    fn is_stale_fetch(&self, generation: u64) -> bool {
        if generation == self.fetch_generation {
            return false;
        }
        tracing::debug!(
            list_view = %self.list_view,
            generation,
            current = self.fetch_generation,
            "discarding preference fetch issued before the last save"
        );
        true
    }

    fn select(&mut self, name: String, tree: SerializedTree) -> Vec<Effect> {
        self.selected = Some(name.clone());
        self.detector.clear_selected();
        vec![
            Effect::ApplyTreeToEditor {
                tree: tree.clone(),
                submit: false,
            },
            Effect::SnapshotSelection { name, tree },
        ]
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.detector.clear_selected();
    }

    /// Runs once both the reload decision and the first fetch are in.
    fn resolve_startup_default(&mut self) -> Vec<Effect> {
        if self.phase != StartupPhase::ReloadDecided || !self.initial_fetch_done {
            return Vec::new();
        }
        self.phase.advance_to(StartupPhase::DefaultResolved);

        let default = if self.reloader.hydrated() {
            None
        } else {
            self.record.as_ref().and_then(|record| {
                self.resolver
                    .resolve(&record.saved_searches, &self.list_view)
                    .map(|(name, entry)| (name.to_owned(), entry.query_tree.clone()))
            })
        };

        match default {
            Some((name, tree)) => self.select(name, tree),
            None => {
                self.phase.advance_to(StartupPhase::Ready);
                Vec::new()
            }
        }
    }

    /// After a refetch the selected entry may have been changed or removed elsewhere.
    fn reconcile_selection(&mut self) -> Vec<Effect> {
        let Some(name) = self.selected.clone() else {
            return Vec::new();
        };
        match self.entry(&name) {
            Some(entry) => {
                let tree = entry.query_tree.clone();
                vec![Effect::SnapshotSelection { name, tree }]
            }
            None => {
                self.clear_selection();
                Vec::new()
            }
        }
    }

    /// Deep copy of the last fetched record to build the next save from.
    fn begin_mutation(&mut self) -> Option<UserPreferenceRecord> {
        if self.mutation_status == OperationStatus::Running {
            self.last_error = Some(SavedSearchError::MutationInFlight);
            return None;
        }
        let Some(record) = self.record.as_ref() else {
            self.last_error = Some(SavedSearchError::Unavailable);
            return None;
        };
        Some(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ListViewId, OwnerId, PreferenceId};
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};

    fn tree(label: &str) -> SerializedTree {
        SerializedTree::new(json!({ "id": format!("node-{label}"), "filter": label }))
    }

    /// Ignores the node id, the way a real editor drops generated identifiers.
    fn canonical(tree: &SerializedTree) -> String {
        tree.as_value()
            .get("filter")
            .cloned()
            .unwrap_or_default()
            .to_string()
    }

    fn material_sample() -> ListViewId {
        ListViewId::new("material-sample")
    }

    fn owner() -> OwnerId {
        OwnerId::new("user-7")
    }

    fn record_with(entries: &[(&str, bool, SerializedTree)]) -> UserPreferenceRecord {
        let mut record = UserPreferenceRecord::unsaved(owner());
        record.id = Some(PreferenceId("pref-1".to_owned()));
        for (name, is_default, tree) in entries {
            record.saved_searches.upsert(
                &material_sample(),
                name,
                *is_default,
                Some(tree.clone()),
            );
        }
        record
    }

    /// Plays the engine's part: editor and cache effects resolve immediately, network
    /// effects are parked until the test completes them.
    struct Harness {
        state: SavedSearchState,
        editor_tree: SerializedTree,
        submits: usize,
        cache: HashMap<String, String>,
        fetches: usize,
        last_fetch_generation: u64,
        saves: VecDeque<(UserPreferenceRecord, PendingMutation)>,
    }

    impl Harness {
        fn new(wants_last_used: bool) -> Self {
            Self {
                state: SavedSearchState::new(material_sample(), owner(), wants_last_used),
                editor_tree: SerializedTree::default(),
                submits: 0,
                cache: HashMap::new(),
                fetches: 0,
                last_fetch_generation: 0,
                saves: VecDeque::new(),
            }
        }

        fn dispatch(&mut self, action: Action) {
            let mut actions = VecDeque::from([action]);
            while let Some(action) = actions.pop_front() {
                for effect in self.state.apply(action) {
                    match effect {
                        Effect::ReadLastUsedTree { key } => {
                            let tree = crate::cached_tree_for_reload(
                                self.cache.get(&key).map(String::as_str),
                                |_| true,
                            );
                            actions.push_back(Action::LastUsedTreeRead { tree });
                        }
                        Effect::WriteLastUsedTree { key, tree } => {
                            self.cache.insert(key, tree.to_json_string());
                        }
                        Effect::ApplyTreeToEditor { tree, submit } => {
                            self.editor_tree = tree.clone();
                            if submit {
                                self.submits += 1;
                            }
                            let canonical = canonical(&tree);
                            actions.push_back(Action::LiveTreeChanged { tree, canonical });
                        }
                        Effect::SnapshotSelection { name, tree } => {
                            actions.push_back(Action::SelectionSnapshotted {
                                name,
                                canonical: canonical(&tree),
                            });
                        }
                        Effect::FetchPreference {
                            owner_id,
                            generation,
                        } => {
                            assert_eq!(owner_id, owner());
                            self.fetches += 1;
                            self.last_fetch_generation = generation;
                        }
                        Effect::SavePreference { record, mutation } => {
                            self.saves.push_back((*record, mutation));
                        }
                    }
                }
            }
        }

        fn edit(&mut self, tree: SerializedTree) {
            self.editor_tree = tree.clone();
            let canonical = canonical(&tree);
            self.dispatch(Action::LiveTreeChanged { tree, canonical });
        }

        fn fetched(&mut self, record: Option<UserPreferenceRecord>) {
            self.dispatch(Action::PreferenceLoaded {
                generation: self.last_fetch_generation,
                record: record.map(Box::new),
            });
        }

        fn complete_save(&mut self) -> UserPreferenceRecord {
            let (mut record, mutation) = self.saves.pop_front().expect("pending save");
            if record.id.is_none() {
                record.id = Some(PreferenceId("pref-new".to_owned()));
            }
            self.dispatch(Action::PreferenceSaved {
                record: Box::new(record.clone()),
                mutation,
            });
            record
        }

        fn save(&mut self, name: &str, is_default: bool, capture: bool) {
            let tree = capture.then(|| self.editor_tree.clone());
            self.dispatch(Action::SaveSearchRequested {
                name: name.to_owned(),
                is_default,
                tree,
            });
        }
    }

    #[test]
    fn default_search_hydrates_editor_after_fetch() {
        let mut h = Harness::new(false);
        h.dispatch(Action::Mounted);
        assert_eq!(h.state.phase, StartupPhase::ReloadDecided);
        assert!(h.state.is_loading());
        assert_eq!(h.fetches, 1);

        h.fetched(Some(record_with(&[("My Search", true, tree("t1"))])));

        assert_eq!(h.editor_tree, tree("t1"));
        assert_eq!(h.state.selected.as_deref(), Some("My Search"));
        assert!(!h.state.has_unsaved_changes());
        assert_eq!(h.state.phase, StartupPhase::Ready);
        assert!(!h.state.is_loading());
        assert_eq!(h.submits, 0);
    }

    #[test]
    fn material_sample_scenario_edit_then_overwrite_default() {
        let mut h = Harness::new(false);
        h.dispatch(Action::Mounted);
        h.fetched(Some(record_with(&[("My Search", true, tree("t1"))])));

        h.edit(tree("t2"));
        assert!(h.state.has_unsaved_changes());

        h.save("My Search", true, true);
        assert!(h.state.mutation_in_flight());
        let saved = h.complete_save();

        let entry = saved
            .saved_searches
            .entry(&material_sample(), "My Search")
            .expect("entry");
        assert_eq!(entry.query_tree, tree("t2"));
        assert!(entry.is_default);
        assert!(!h.state.has_unsaved_changes());
        assert!(!h.state.mutation_in_flight());
        assert_eq!(h.fetches, 2, "a successful save is followed by a refetch");
    }

    #[test]
    fn reload_flag_with_cache_wins_over_default() {
        let mut h = Harness::new(true);
        h.cache.insert(
            "material-sample-last-used-tree".to_owned(),
            tree("cached").to_json_string(),
        );
        h.dispatch(Action::Mounted);

        assert_eq!(h.editor_tree, tree("cached"));
        assert_eq!(h.submits, 1);

        h.fetched(Some(record_with(&[("My Search", true, tree("t1"))])));

        assert_eq!(h.editor_tree, tree("cached"));
        assert_eq!(h.state.selected, None);
        assert_eq!(h.state.phase, StartupPhase::Ready);

        h.dispatch(Action::LoadRequested);
        h.fetched(Some(record_with(&[("My Search", true, tree("t1"))])));
        assert_eq!(h.editor_tree, tree("cached"));
        assert_eq!(h.submits, 1);
    }

    #[test]
    fn cache_is_ignored_without_reload_flag() {
        let mut h = Harness::new(false);
        h.cache.insert(
            "material-sample-last-used-tree".to_owned(),
            tree("cached").to_json_string(),
        );
        h.dispatch(Action::Mounted);
        h.fetched(Some(record_with(&[("My Search", true, tree("t1"))])));

        assert_eq!(h.editor_tree, tree("t1"));
        assert_eq!(h.submits, 0);
    }

    #[test]
    fn reload_flag_with_malformed_cache_falls_back_to_default() {
        let mut h = Harness::new(true);
        h.cache.insert(
            "material-sample-last-used-tree".to_owned(),
            "{broken".to_owned(),
        );
        h.dispatch(Action::Mounted);
        assert_eq!(h.submits, 0);

        h.fetched(Some(record_with(&[("My Search", true, tree("t1"))])));
        assert_eq!(h.editor_tree, tree("t1"));
    }

    #[test]
    fn fetch_arriving_before_reload_decision_waits_for_it() {
        let mut state = SavedSearchState::new(material_sample(), owner(), true);
        let effects = state.apply(Action::Mounted);
        assert!(matches!(effects[0], Effect::ReadLastUsedTree { .. }));

        let effects = state.apply(Action::PreferenceLoaded {
            generation: 0,
            record: Some(Box::new(record_with(&[("d", true, tree("d"))]))),
        });
        assert!(effects.is_empty());
        assert_eq!(state.phase, StartupPhase::Uninitialized);

        let effects = state.apply(Action::LastUsedTreeRead { tree: None });
        assert_eq!(state.phase, StartupPhase::DefaultResolved);
        assert!(matches!(
            effects.as_slice(),
            [
                Effect::ApplyTreeToEditor { submit: false, .. },
                Effect::SnapshotSelection { .. }
            ]
        ));
    }

    #[test]
    fn no_default_leaves_editor_untouched() {
        let mut h = Harness::new(false);
        h.dispatch(Action::Mounted);
        h.edit(tree("typed-early"));
        h.fetched(Some(record_with(&[("plain", false, tree("p"))])));

        assert_eq!(h.editor_tree, tree("typed-early"));
        assert_eq!(h.state.selected, None);
        assert_eq!(h.state.phase, StartupPhase::Ready);
    }

    #[test]
    fn live_changes_are_cached_only_after_reload_decision() {
        let mut h = Harness::new(true);
        h.edit(tree("before-mount"));
        assert!(h.cache.is_empty());

        h.dispatch(Action::Mounted);
        h.edit(tree("after-mount"));
        assert_eq!(
            h.cache.get("material-sample-last-used-tree"),
            Some(&tree("after-mount").to_json_string())
        );
    }

    #[test]
    fn select_then_edit_then_revert_tracks_dirty() {
        let mut h = Harness::new(false);
        h.dispatch(Action::Mounted);
        h.fetched(Some(record_with(&[
            ("a", false, tree("a")),
            ("b", false, tree("b")),
        ])));

        h.dispatch(Action::SelectRequested {
            name: "b".to_owned(),
        });
        assert_eq!(h.editor_tree, tree("b"));
        assert!(!h.state.has_unsaved_changes());

        h.edit(tree("b2"));
        assert!(h.state.has_unsaved_changes());

        // Same filter, new node id: canonically unchanged.
        h.edit(SerializedTree::new(json!({"id": "regenerated", "filter": "b"})));
        assert!(!h.state.has_unsaved_changes());
    }

    #[test]
    fn capture_create_then_select_round_trips() {
        let mut h = Harness::new(false);
        h.dispatch(Action::Mounted);
        h.fetched(None);
        assert!(h.state.is_available());

        h.edit(tree("captured"));
        h.save("A", false, true);
        let saved = h.complete_save();
        assert_eq!(saved.id, Some(PreferenceId("pref-new".to_owned())));

        h.edit(tree("elsewhere"));
        h.dispatch(Action::SelectRequested {
            name: "A".to_owned(),
        });
        assert_eq!(canonical(&h.editor_tree), canonical(&tree("captured")));
        assert!(!h.state.has_unsaved_changes());
    }

    #[test]
    fn set_default_keeps_stored_tree_and_moves_flag() {
        let mut h = Harness::new(false);
        h.dispatch(Action::Mounted);
        h.fetched(Some(record_with(&[
            ("a", true, tree("a")),
            ("b", false, tree("b")),
        ])));
        h.edit(tree("unsaved"));

        h.save("b", true, false);
        let saved = h.complete_save();

        let searches = saved
            .saved_searches
            .list_view(&material_sample())
            .expect("searches");
        assert!(!searches["a"].is_default);
        assert!(searches["b"].is_default);
        assert_eq!(searches["b"].query_tree, tree("b"));
        assert_eq!(h.state.selected.as_deref(), Some("b"));
        assert!(h.state.has_unsaved_changes());
    }

    #[test]
    fn save_of_unknown_name_without_capture_is_rejected() {
        let mut h = Harness::new(false);
        h.dispatch(Action::Mounted);
        h.fetched(None);

        h.save("ghost", true, false);
        assert!(h.saves.is_empty());
        assert_eq!(
            h.state.last_error,
            Some(SavedSearchError::UnknownSearch {
                name: "ghost".to_owned()
            })
        );
    }

    #[test]
    fn failed_save_leaves_record_untouched() {
        let mut h = Harness::new(false);
        h.dispatch(Action::Mounted);
        let original = record_with(&[("a", true, tree("a"))]);
        h.fetched(Some(original.clone()));

        h.edit(tree("changed"));
        h.save("a", true, true);
        let (_, mutation) = h.saves.pop_front().expect("pending save");
        h.dispatch(Action::PreferenceSaveFailed {
            mutation,
            message: "503".to_owned(),
        });

        assert_eq!(h.state.record.as_ref(), Some(&original));
        assert_eq!(
            h.state.last_error,
            Some(SavedSearchError::SaveFailed {
                name: "a".to_owned(),
                message: "503".to_owned()
            })
        );
        assert!(!h.state.mutation_in_flight());
        assert_eq!(h.fetches, 1);
    }

    #[test]
    fn second_mutation_while_saving_is_rejected() {
        let mut h = Harness::new(false);
        h.dispatch(Action::Mounted);
        h.fetched(Some(record_with(&[("a", false, tree("a"))])));

        h.save("a", true, false);
        h.dispatch(Action::DeleteSearchRequested {
            name: "a".to_owned(),
        });

        assert_eq!(h.saves.len(), 1);
        assert_eq!(h.state.last_error, Some(SavedSearchError::MutationInFlight));
    }

    #[test]
    fn delete_of_selected_search_clears_selection() {
        let mut h = Harness::new(false);
        h.dispatch(Action::Mounted);
        h.fetched(Some(record_with(&[("a", true, tree("a"))])));
        assert_eq!(h.state.selected.as_deref(), Some("a"));

        h.dispatch(Action::DeleteSearchRequested {
            name: "a".to_owned(),
        });
        let saved = h.complete_save();

        assert!(saved.saved_searches.list_view(&material_sample()).is_none());
        assert_eq!(h.state.selected, None);
        h.edit(tree("anything"));
        assert!(!h.state.has_unsaved_changes());
    }

    #[test]
    fn delete_on_never_saved_record_is_a_no_op() {
        let mut h = Harness::new(false);
        h.dispatch(Action::Mounted);
        h.fetched(None);

        h.dispatch(Action::DeleteSearchRequested {
            name: "a".to_owned(),
        });
        assert!(h.saves.is_empty());
        assert_eq!(h.state.last_error, None);
    }

    #[test]
    fn mutations_keep_other_list_views() {
        let mut h = Harness::new(false);
        h.dispatch(Action::Mounted);
        let mut record = record_with(&[]);
        record.saved_searches.upsert(
            &ListViewId::new("agent"),
            "people",
            true,
            Some(tree("people")),
        );
        record
            .other
            .insert("uiTheme".to_owned(), json!("dark"));
        h.fetched(Some(record));

        h.edit(tree("mine"));
        h.save("mine", false, true);
        let (sent, _) = h.saves.front().cloned().expect("pending save");

        assert!(
            sent.saved_searches
                .entry(&ListViewId::new("agent"), "people")
                .is_some()
        );
        assert_eq!(sent.other.get("uiTheme"), Some(&json!("dark")));
        assert!(
            h.state
                .record
                .as_ref()
                .expect("record")
                .saved_searches
                .list_view(&material_sample())
                .is_none(),
            "in-memory record must not change before the save succeeds"
        );
    }

    #[test]
    fn fetch_failure_makes_feature_unavailable() {
        let mut h = Harness::new(false);
        h.dispatch(Action::Mounted);
        h.dispatch(Action::PreferenceLoadFailed {
            generation: h.last_fetch_generation,
            message: "401".to_owned(),
        });

        assert!(!h.state.is_available());
        assert!(!h.state.is_loading());
        assert_eq!(h.state.phase, StartupPhase::Ready);
        assert!(matches!(
            h.state.last_error,
            Some(SavedSearchError::FetchFailed { .. })
        ));

        h.save("a", false, true);
        assert_eq!(h.state.last_error, Some(SavedSearchError::Unavailable));
    }

    #[test]
    fn refetch_drops_selection_removed_elsewhere() {
        let mut h = Harness::new(false);
        h.dispatch(Action::Mounted);
        h.fetched(Some(record_with(&[("a", true, tree("a"))])));
        assert_eq!(h.state.selected.as_deref(), Some("a"));

        h.dispatch(Action::LoadRequested);
        h.fetched(Some(record_with(&[("b", false, tree("b"))])));
        assert_eq!(h.state.selected, None);
        assert_eq!(h.editor_tree, tree("a"));
    }

    #[test]
    fn duplicate_load_while_fetching_issues_one_call() {
        let mut h = Harness::new(false);
        h.dispatch(Action::Mounted);
        h.dispatch(Action::LoadRequested);
        assert_eq!(h.fetches, 1);
    }

    #[test]
    fn load_issued_before_save_cannot_overwrite_saved_record() {
        let mut h = Harness::new(false);
        h.dispatch(Action::Mounted);
        h.fetched(Some(record_with(&[("a", true, tree("a"))])));
        let before_save = h.state.record.clone().unwrap();

        h.edit(tree("b"));
        h.save("b", false, true);
        h.dispatch(Action::LoadRequested);
        let stale_generation = h.last_fetch_generation;
        assert_eq!(h.fetches, 2);

        let saved = h.complete_save();
        assert_eq!(h.fetches, 3);
        assert!(h.state.fetch_generation() > stale_generation);
        assert_eq!(h.state.selected.as_deref(), Some("b"));

        let effects = h.state.apply(Action::PreferenceLoaded {
            generation: stale_generation,
            record: Some(Box::new(before_save)),
        });
        assert!(effects.is_empty());
        assert!(h.state.entry("b").is_some());
        assert_eq!(h.state.selected.as_deref(), Some("b"));
        assert_eq!(h.state.fetch_status, OperationStatus::Running);

        let effects = h.state.apply(Action::PreferenceLoadFailed {
            generation: stale_generation,
            message: "timeout".to_owned(),
        });
        assert!(effects.is_empty());
        assert!(h.state.is_available());
        assert_eq!(h.state.last_error, None);

        h.fetched(Some(saved));
        assert_eq!(h.state.fetch_status, OperationStatus::Idle);
        assert_eq!(h.state.selected.as_deref(), Some("b"));
        assert!(!h.state.has_unsaved_changes());
    }

    #[test]
    fn results_after_unmount_are_discarded() {
        let mut h = Harness::new(false);
        h.dispatch(Action::Mounted);
        h.dispatch(Action::Unmounted);
        h.fetched(Some(record_with(&[("a", true, tree("a"))])));

        assert!(h.state.record.is_none());
        assert!(h.state.is_unmounted());
    }

    #[test]
    fn list_entries_are_sorted_and_flag_selection() {
        let mut h = Harness::new(false);
        h.dispatch(Action::Mounted);
        h.fetched(Some(record_with(&[
            ("zeta", false, tree("z")),
            ("alpha", true, tree("a")),
        ])));

        let listed = h.state.list_entries();
        let names = listed.iter().map(|l| l.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert!(listed[0].entry.is_default && listed[0].selected);
        assert_eq!(listed[0].entry.query_tree, tree("a"));
        assert!(!listed[1].entry.is_default && !listed[1].selected);
        assert_eq!(listed[1].entry.query_tree, tree("z"));
    }
}
