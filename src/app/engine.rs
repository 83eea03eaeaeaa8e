use super::config::PaletteConfig;
use super::filter::{filter, FilterResult};
use super::input::{map_palette_key, PaletteInput};
use super::keymap::{match_shortcut, shortcut_target, KeyDecision};
use super::recency::{RecencyList, RecencyStore};
use super::registry::CommandRegistry;
use super::state::PaletteState;
use crate::domain::command::{Command, CommandAction};
use crate::domain::key::KeyInput;
use crate::domain::ports::{
    ExecutionObserver, KeyEventSource, KeySubscription, KeyValueStore, Router,
};
use crate::error::{PaletteError, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Collaborators the engine is built from.
pub struct EngineDeps {
    pub router: Arc<dyn Router>,
    pub store: Option<Arc<dyn KeyValueStore>>,
    pub observer: Option<Arc<dyn ExecutionObserver>>,
    pub custom_commands: Vec<Command>,
}

impl EngineDeps {
    pub fn new(router: Arc<dyn Router>) -> Self {
        Self {
            router,
            store: None,
            observer: None,
            custom_commands: Vec::new(),
        }
    }
}

/// Result of feeding one key press to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOutcome {
    pub decision: KeyDecision,
    /// The host should suppress the key's default behaviour.
    pub consumed: bool,
}

/// Owns the palette state machine and is the only writer of palette state
/// and the recency list.
pub struct PaletteEngine {
    registry: CommandRegistry,
    state: PaletteState,
    recency: RecencyList,
    recency_store: Option<RecencyStore>,
    router: Arc<dyn Router>,
    observer: Option<Arc<dyn ExecutionObserver>>,
    subscription: Option<KeySubscription>,
    pending_saves: Vec<JoinHandle<()>>,
}

impl PaletteEngine {
    /// Builds the registry and rehydrates the recency list from storage.
    pub async fn mount(deps: EngineDeps, config: &PaletteConfig) -> Result<Self> {
        let registry = CommandRegistry::new(deps.custom_commands, config.duplicate_policy)?;
        let recency_store = deps
            .store
            .map(|store| RecencyStore::new(store, config.storage_key.clone()));

        let stored = match &recency_store {
            Some(store) => store.load().await,
            None => None,
        };
        let recency = RecencyList::from_ids(
            stored.unwrap_or_else(|| config.default_recent.clone()),
            config.recent_capacity,
        );
        debug!(
            commands = registry.len(),
            recent = recency.ids().len(),
            "command palette mounted"
        );

        Ok(Self {
            registry,
            state: PaletteState::default(),
            recency,
            recency_store,
            router: deps.router,
            observer: deps.observer,
            subscription: None,
            pending_saves: Vec::new(),
        })
    }

    // --- Accessors ---

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    pub fn state(&self) -> &PaletteState {
        &self.state
    }

    pub fn query(&self) -> &str {
        &self.state.query
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn recent_ids(&self) -> &[String] {
        self.recency.ids()
    }

    pub fn recent_commands(&self) -> Vec<&Command> {
        self.recency.materialize(&self.registry)
    }

    /// What the palette currently displays for its query.
    pub fn results(&self) -> FilterResult<'_> {
        let recent = self.recent_commands();
        filter(&self.state.query, self.registry.commands(), &recent)
    }

    pub fn selected_command(&self) -> Option<&Command> {
        if !self.is_open() {
            return None;
        }
        self.results().flatten().get(self.state.selected_index).copied()
    }

    // --- State transitions ---

    pub fn open(&mut self) {
        if !self.is_open() {
            self.state.open();
            debug!("palette opened");
        }
    }

    pub fn close(&mut self) {
        if self.is_open() {
            self.state.close();
            debug!("palette closed");
        }
    }

    pub fn toggle(&mut self) {
        if self.is_open() {
            self.close();
        } else {
            self.open();
        }
    }

    /// Replaces the query. Ignored while closed.
    pub fn set_query(&mut self, query: impl Into<String>) {
        if !self.is_open() {
            debug!("query ignored while palette is closed");
            return;
        }
        self.state.set_query(query.into());
    }

    /// Feeds one key press through the shortcut matcher and applies the
    /// resulting transition. Errors from a command's action are returned
    /// after the palette has closed.
    ///
    /// An `Err` only comes from running a command, either a global shortcut
    /// or Enter in the open palette. In both cases the key was consumed and
    /// the host should suppress its default behaviour.
    pub fn handle_key(&mut self, input: &KeyInput) -> Result<KeyOutcome> {
        let decision = match_shortcut(input, self.is_open(), self.registry.commands());
        let mut consumed = decision.consumes_event();

        match &decision {
            KeyDecision::ToggleOpen => self.toggle(),
            KeyDecision::Close => self.close(),
            KeyDecision::InvokeCommand(id) => {
                // Resolve by key, not id: kept duplicates share an id.
                let command = shortcut_target(&input.key, self.registry.commands())
                    .cloned()
                    .ok_or_else(|| PaletteError::UnknownCommand { id: id.clone() })?;
                self.execute(&command)?;
            }
            KeyDecision::Ignore => {
                if self.is_open() {
                    if let Some(palette_input) = map_palette_key(input) {
                        consumed = true;
                        self.apply_input(palette_input)?;
                    }
                }
            }
        }

        Ok(KeyOutcome { decision, consumed })
    }

    fn apply_input(&mut self, input: PaletteInput) -> Result<()> {
        match input {
            PaletteInput::Type(c) => {
                let mut query = self.state.query.clone();
                query.push(c);
                self.state.set_query(query);
            }
            PaletteInput::Backspace => {
                let mut query = self.state.query.clone();
                query.pop();
                self.state.set_query(query);
            }
            PaletteInput::SelectNext => {
                let rows = self.results().len();
                self.state.select_next(rows);
            }
            PaletteInput::SelectPrev => {
                let rows = self.results().len();
                self.state.select_prev(rows);
            }
            PaletteInput::Execute => {
                self.execute_selected()?;
            }
        }
        Ok(())
    }

    // --- Execution ---

    /// Runs the command the user picked from the open palette, then closes it.
    pub fn select(&mut self, id: &str) -> Result<()> {
        if !self.is_open() {
            return Err(PaletteError::PaletteClosed);
        }
        let command = self.lookup(id)?;
        self.execute(&command)
    }

    /// Runs the highlighted row. Returns `false` when nothing is displayed.
    pub fn execute_selected(&mut self) -> Result<bool> {
        if !self.is_open() {
            return Err(PaletteError::PaletteClosed);
        }
        let Some(command) = self.selected_command().cloned() else {
            return Ok(false);
        };
        self.execute(&command)?;
        Ok(true)
    }

    /// Runs a command without going through the palette, as a global
    /// single-key shortcut does.
    pub fn invoke(&mut self, id: &str) -> Result<()> {
        let command = self.lookup(id)?;
        self.execute(&command)
    }

    fn lookup(&self, id: &str) -> Result<Command> {
        self.registry
            .get(id)
            .cloned()
            .ok_or_else(|| PaletteError::UnknownCommand { id: id.to_string() })
    }

    fn execute(&mut self, command: &Command) -> Result<()> {
        let result = self.run_action(command);

        if result.is_ok() {
            let ids = self.recency.record(command.id()).to_vec();
            self.persist(ids);
            if let Some(observer) = &self.observer {
                observer.on_command_executed(command);
            }
            info!(id = command.id(), "command executed");
        }

        // Closing does not depend on the action succeeding.
        self.close();

        result.map_err(|source| PaletteError::Action {
            id: command.id().to_string(),
            source,
        })
    }

    fn run_action(&self, command: &Command) -> anyhow::Result<()> {
        match command.action() {
            CommandAction::Navigate(path) => self.router.navigate(path),
            CommandAction::Log(message) => {
                info!(id = command.id(), "{message}");
                Ok(())
            }
            CommandAction::Custom(action) => action(),
        }
    }

    fn persist(&mut self, ids: Vec<String>) {
        let Some(store) = &self.recency_store else {
            return;
        };
        self.pending_saves.retain(|handle| !handle.is_finished());
        if let Some(handle) = store.spawn_save(ids) {
            self.pending_saves.push(handle);
        }
    }

    /// Waits for in-flight recency writes.
    pub async fn flush(&mut self) {
        for handle in self.pending_saves.drain(..) {
            if let Err(err) = handle.await {
                warn!(error = %err, "recent commands write task failed");
            }
        }
    }

    // --- Key subscription ---

    /// Starts listening to `source`. Only one source may be attached.
    pub fn attach(&mut self, source: &dyn KeyEventSource) -> Result<()> {
        if self.subscription.is_some() {
            return Err(PaletteError::AlreadyAttached);
        }
        self.subscription = Some(source.subscribe());
        debug!("key listener attached");
        Ok(())
    }

    /// Releases the key subscription. Returns whether one was attached.
    pub fn detach(&mut self) -> bool {
        let attached = self.subscription.take().is_some();
        if attached {
            debug!("key listener detached");
        }
        attached
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Handles the next key from the attached source. `None` when nothing is
    /// attached or the source has shut down.
    pub async fn pump(&mut self) -> Option<Result<KeyOutcome>> {
        let next = match self.subscription.as_mut() {
            Some(subscription) => subscription.next().await,
            None => return None,
        };
        let Some(input) = next else {
            self.subscription = None;
            debug!("key source closed");
            return None;
        };
        Some(self.handle_key(&input))
    }

    /// Handles keys until the source shuts down. Stops at the first failing
    /// command; calling `run` again resumes with the same subscription.
    pub async fn run(&mut self) -> Result<()> {
        while let Some(outcome) = self.pump().await {
            outcome?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for PaletteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaletteEngine")
            .field("state", &self.state)
            .field("recency", &self.recency)
            .field("commands", &self.registry.len())
            .field("attached", &self.subscription.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
