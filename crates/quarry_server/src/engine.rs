use anyhow::Context as _;
use quarry_api::{SavedSearchListingSnapshot, SavedSearchSnapshot};
use quarry_backend::{BackendConfig, BackendServices};
use quarry_domain::{
    Action, Effect, ListViewId, LocalCache, OwnerId, PreferenceGateway,
    QueryTreeEditor, SaveOptions, SavedSearchError, SavedSearchListing, SavedSearchState,
    SerializedTree, StartupPhase, cached_tree_for_reload, wants_last_used,
};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

type Reply = oneshot::Sender<Result<(), SavedSearchError>>;

/// Collaborators the engine runs effects against.
#[derive(Clone)]
pub struct EngineServices {
    pub gateway: Arc<dyn PreferenceGateway>,
    pub cache: Arc<dyn LocalCache>,
    pub editor: Arc<dyn QueryTreeEditor>,
}

/// Wires the HTTP gateway and the SQLite cache from the environment. Builds a blocking
/// HTTP client, so call it outside of the async runtime (e.g. from `spawn_blocking`).
pub fn new_default_services(editor: Arc<dyn QueryTreeEditor>) -> anyhow::Result<EngineServices> {
    let config = BackendConfig::from_env().context("failed to read backend config")?;
    let backend = BackendServices::open(&config)?;
    Ok(EngineServices {
        gateway: backend.gateway,
        cache: backend.cache,
        editor,
    })
}

/// What one mounted list view is: which listing, whose preferences, and the page URL query.
#[derive(Clone, Debug)]
pub struct EngineContext {
    pub list_view: ListViewId,
    pub owner_id: OwnerId,
    pub url_query: String,
}

#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub async fn snapshot(&self) -> anyhow::Result<SavedSearchSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::GetSnapshot { reply: tx })
            .await
            .context("engine unavailable")?;
        rx.await.context("engine stopped")
    }

    pub async fn list_entries(&self) -> anyhow::Result<Vec<SavedSearchListing>> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::ListEntries { reply: tx })
            .await
            .context("engine unavailable")?;
        rx.await.context("engine stopped")
    }

    /// Re-fetches the preference record. Resolves once the fetch has landed.
    pub async fn load(&self) -> anyhow::Result<()> {
        self.request(|reply| EngineCommand::Load { reply }).await
    }

    pub async fn select(&self, name: impl Into<String>) -> anyhow::Result<()> {
        let name = name.into();
        self.request(|reply| EngineCommand::Select { name, reply })
            .await
    }

    /// Resolves after the save round trip. The record is only replaced on success.
    pub async fn create_or_update(
        &self,
        name: impl Into<String>,
        options: SaveOptions,
    ) -> anyhow::Result<()> {
        let name = name.into();
        self.request(|reply| EngineCommand::CreateOrUpdate {
            name,
            options,
            reply,
        })
        .await
    }

    pub async fn set_default(&self, name: impl Into<String>, value: bool) -> anyhow::Result<()> {
        self.create_or_update(
            name,
            SaveOptions {
                is_default: value,
                capture_current_tree: false,
            },
        )
        .await
    }

    pub async fn delete(&self, name: impl Into<String>) -> anyhow::Result<()> {
        let name = name.into();
        self.request(|reply| EngineCommand::Delete { name, reply })
            .await
    }

    /// Reports an edit made in the query-tree editor.
    pub async fn live_tree_changed(&self, tree: SerializedTree) -> anyhow::Result<()> {
        self.tx
            .send(EngineCommand::LiveTreeChanged { tree })
            .await
            .context("engine unavailable")
    }

    pub async fn unmount(&self) -> anyhow::Result<()> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::Unmount { reply: tx })
            .await
            .context("engine unavailable")?;
        rx.await.context("engine stopped")
    }

    async fn request(
        &self,
        command: impl FnOnce(Reply) -> EngineCommand,
    ) -> anyhow::Result<()> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(command(tx))
            .await
            .context("engine unavailable")?;
        rx.await.context("engine stopped")??;
        Ok(())
    }
}

pub enum EngineCommand {
    GetSnapshot {
        reply: oneshot::Sender<SavedSearchSnapshot>,
    },
    ListEntries {
        reply: oneshot::Sender<Vec<SavedSearchListing>>,
    },
    Load {
        reply: Reply,
    },
    Select {
        name: String,
        reply: Reply,
    },
    CreateOrUpdate {
        name: String,
        options: SaveOptions,
        reply: Reply,
    },
    Delete {
        name: String,
        reply: Reply,
    },
    LiveTreeChanged {
        tree: SerializedTree,
    },
    Unmount {
        reply: oneshot::Sender<()>,
    },
    DispatchAction {
        action: Box<Action>,
    },
}

struct CacheWrite {
    key: String,
    value: String,
}

pub struct Engine {
    state: SavedSearchState,
    rev: u64,
    services: EngineServices,
    snapshots: broadcast::Sender<SavedSearchSnapshot>,
    tx: mpsc::Sender<EngineCommand>,
    cache_writes: mpsc::UnboundedSender<CacheWrite>,
    pending_loads: Vec<Reply>,
    pending_mutation: Option<Reply>,
}

impl Engine {
    pub fn start(
        context: EngineContext,
        services: EngineServices,
    ) -> (EngineHandle, broadcast::Sender<SavedSearchSnapshot>) {
        let (tx, mut rx) = mpsc::channel::<EngineCommand>(256);
        let (snapshots, _) = broadcast::channel::<SavedSearchSnapshot>(256);
        let cache_writes = spawn_cache_writer(services.cache.clone());

        let mut engine = Self {
            state: SavedSearchState::new(
                context.list_view,
                context.owner_id,
                wants_last_used(&context.url_query),
            ),
            rev: 0,
            services,
            snapshots: snapshots.clone(),
            tx: tx.clone(),
            cache_writes,
            pending_loads: Vec::new(),
            pending_mutation: None,
        };

        tokio::spawn(async move {
            engine.process_action_queue(Action::Mounted).await;
            while let Some(cmd) = rx.recv().await {
                if !engine.handle(cmd).await {
                    break;
                }
            }
            tracing::debug!(list_view = %engine.state.list_view, "saved search engine stopped");
        });

        (EngineHandle { tx }, snapshots)
    }

    /// Returns `false` once the engine should stop.
    async fn handle(&mut self, cmd: EngineCommand) -> bool {
        match cmd {
            EngineCommand::GetSnapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            EngineCommand::ListEntries { reply } => {
                let _ = reply.send(self.state.list_entries());
            }
            EngineCommand::Load { reply } => {
                self.pending_loads.push(reply);
                self.process_action_queue(Action::LoadRequested).await;
            }
            EngineCommand::Select { name, reply } => {
                self.state.clear_error();
                self.process_action_queue(Action::SelectRequested { name })
                    .await;
                let _ = reply.send(self.outcome());
            }
            EngineCommand::CreateOrUpdate {
                name,
                options,
                reply,
            } => {
                let tree = options
                    .capture_current_tree
                    .then(|| self.services.editor.current_tree());
                let action = Action::SaveSearchRequested {
                    name,
                    is_default: options.is_default,
                    tree,
                };
                self.run_mutation(action, reply).await;
            }
            EngineCommand::Delete { name, reply } => {
                self.run_mutation(Action::DeleteSearchRequested { name }, reply)
                    .await;
            }
            EngineCommand::LiveTreeChanged { tree } => {
                let canonical = self.services.editor.canonical_string(&tree);
                self.process_action_queue(Action::LiveTreeChanged { tree, canonical })
                    .await;
            }
            EngineCommand::Unmount { reply } => {
                self.process_action_queue(Action::Unmounted).await;
                let _ = reply.send(());
                return false;
            }
            EngineCommand::DispatchAction { action } => {
                self.process_action_queue(*action).await;
            }
        }
        true
    }

    async fn run_mutation(&mut self, action: Action, reply: Reply) {
        self.state.clear_error();
        let was_running = self.state.mutation_in_flight();
        self.process_action_queue(action).await;

        if !was_running && self.state.mutation_in_flight() {
            self.pending_mutation = Some(reply);
            return;
        }
        let _ = reply.send(self.outcome());
    }

    fn outcome(&self) -> Result<(), SavedSearchError> {
        match &self.state.last_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn process_action_queue(&mut self, initial: Action) {
        let mut actions = VecDeque::from([initial]);

        while let Some(action) = actions.pop_front() {
            self.rev = self.rev.saturating_add(1);

            let settled = settlement_for_action(&action, self.state.fetch_generation());
            let effects = self.state.apply(action);
            if let Some(settled) = settled {
                self.settle(settled);
            }
            self.publish_snapshot();

            for effect in effects {
                if let Some(followup) = self.run_effect(effect).await {
                    actions.push_back(followup);
                }
            }
        }
    }

    fn settle(&mut self, settled: Settlement) {
        match settled {
            Settlement::Load(result) => {
                for reply in self.pending_loads.drain(..) {
                    let _ = reply.send(result.clone());
                }
            }
            Settlement::Mutation(result) => {
                if let Some(reply) = self.pending_mutation.take() {
                    let _ = reply.send(result);
                }
            }
        }
    }

    async fn run_effect(&mut self, effect: Effect) -> Option<Action> {
        match effect {
            Effect::ReadLastUsedTree { key } => {
                let cache = self.services.cache.clone();
                let read = tokio::task::spawn_blocking(move || cache.get_item(&key))
                    .await
                    .ok()
                    .unwrap_or_else(|| Err("failed to join cache read task".to_owned()));
                let raw = match read {
                    Ok(raw) => raw,
                    Err(message) => {
                        tracing::warn!(
                            list_view = %self.state.list_view,
                            error = %message,
                            "failed to read last used tree, treating as absent"
                        );
                        None
                    }
                };
                let editor = self.services.editor.clone();
                let tree = cached_tree_for_reload(raw.as_deref(), |tree| editor.is_compatible(tree));
                Some(Action::LastUsedTreeRead { tree })
            }
            Effect::WriteLastUsedTree { key, tree } => {
                let write = CacheWrite {
                    key,
                    value: tree.to_json_string(),
                };
                if self.cache_writes.send(write).is_err() {
                    tracing::warn!("local cache writer stopped, dropping last used tree");
                }
                None
            }
            Effect::ApplyTreeToEditor { tree, submit } => {
                let editor = &self.services.editor;
                editor.replace_tree(tree.clone());
                if submit {
                    editor.submit();
                }
                let canonical = editor.canonical_string(&tree);
                Some(Action::LiveTreeChanged { tree, canonical })
            }
            Effect::SnapshotSelection { name, tree } => {
                let canonical = self.services.editor.canonical_string(&tree);
                Some(Action::SelectionSnapshotted { name, canonical })
            }
            Effect::FetchPreference {
                owner_id,
                generation,
            } => {
                let gateway = self.services.gateway.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let loaded =
                        tokio::task::spawn_blocking(move || gateway.fetch_preference(&owner_id))
                            .await
                            .ok()
                            .unwrap_or_else(|| Err("failed to join fetch task".to_owned()));
                    let action = match loaded {
                        Ok(record) => Action::PreferenceLoaded {
                            generation,
                            record: record.map(Box::new),
                        },
                        Err(message) => {
                            tracing::error!(error = %message, "failed to fetch saved searches");
                            Action::PreferenceLoadFailed {
                                generation,
                                message,
                            }
                        }
                    };
                    let _ = tx
                        .send(EngineCommand::DispatchAction {
                            action: Box::new(action),
                        })
                        .await;
                });
                None
            }
            Effect::SavePreference { record, mutation } => {
                let gateway = self.services.gateway.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let saved = tokio::task::spawn_blocking(move || {
                        gateway.save_preference(*record)
                    })
                    .await
                    .ok()
                    .unwrap_or_else(|| Err("failed to join save task".to_owned()));
                    let action = match saved {
                        Ok(record) => Action::PreferenceSaved {
                            record: Box::new(record),
                            mutation,
                        },
                        Err(message) => {
                            tracing::error!(
                                name = %mutation.name(),
                                error = %message,
                                "failed to save saved searches"
                            );
                            Action::PreferenceSaveFailed { mutation, message }
                        }
                    };
                    let _ = tx
                        .send(EngineCommand::DispatchAction {
                            action: Box::new(action),
                        })
                        .await;
                });
                None
            }
        }
    }

    fn publish_snapshot(&self) {
        let _ = self.snapshots.send(self.snapshot());
    }

    fn snapshot(&self) -> SavedSearchSnapshot {
        let state = &self.state;
        SavedSearchSnapshot {
            rev: self.rev,
            list_view: state.list_view.as_str().to_owned(),
            phase: map_phase(state.phase),
            loading: state.is_loading(),
            available: state.is_available(),
            entries: state
                .list_entries()
                .into_iter()
                .map(|listing| SavedSearchListingSnapshot {
                    name: listing.name,
                    is_default: listing.entry.is_default,
                    selected: listing.selected,
                })
                .collect(),
            selected_name: state.selected.clone(),
            selected_is_default: state
                .selected_entry()
                .is_some_and(|(_, entry)| entry.is_default),
            has_unsaved_changes: state.has_unsaved_changes(),
            mutation_in_flight: state.mutation_in_flight(),
            last_error: state.last_error.as_ref().map(ToString::to_string),
        }
    }
}

enum Settlement {
    Load(Result<(), SavedSearchError>),
    Mutation(Result<(), SavedSearchError>),
}

/// Fetch results from before the last save leave pending loads waiting for the refetch.
fn settlement_for_action(action: &Action, fetch_generation: u64) -> Option<Settlement> {
    match action {
        Action::PreferenceLoaded { generation, .. } if *generation == fetch_generation => {
            Some(Settlement::Load(Ok(())))
        }
        Action::PreferenceLoadFailed {
            generation,
            message,
        } if *generation == fetch_generation => {
            Some(Settlement::Load(Err(SavedSearchError::FetchFailed {
                message: message.clone(),
            })))
        }
        Action::PreferenceSaved { .. } => Some(Settlement::Mutation(Ok(()))),
        Action::PreferenceSaveFailed { mutation, message } => {
            Some(Settlement::Mutation(Err(SavedSearchError::SaveFailed {
                name: mutation.name().to_owned(),
                message: message.clone(),
            })))
        }
        _ => None,
    }
}

fn map_phase(phase: StartupPhase) -> quarry_api::StartupPhase {
    match phase {
        StartupPhase::Uninitialized => quarry_api::StartupPhase::Uninitialized,
        StartupPhase::ReloadDecided => quarry_api::StartupPhase::ReloadDecided,
        StartupPhase::DefaultResolved => quarry_api::StartupPhase::DefaultResolved,
        StartupPhase::Ready => quarry_api::StartupPhase::Ready,
    }
}

/// Cache writes are fire-and-forget but must land in order, so they go through one task.
fn spawn_cache_writer(cache: Arc<dyn LocalCache>) -> mpsc::UnboundedSender<CacheWrite> {
    let (tx, mut rx) = mpsc::unbounded_channel::<CacheWrite>();
    tokio::spawn(async move {
        while let Some(write) = rx.recv().await {
            let cache = cache.clone();
            let key = write.key.clone();
            let written =
                tokio::task::spawn_blocking(move || cache.set_item(&write.key, &write.value))
                    .await
                    .ok()
                    .unwrap_or_else(|| Err("failed to join cache write task".to_owned()));
            if let Err(message) = written {
                tracing::warn!(key = %key, error = %message, "failed to write last used tree");
            }
        }
    });
    tx
}
