use super::config::DuplicatePolicy;
use crate::domain::command::{Command, CommandAction, CommandGroup};
use crate::error::{PaletteError, Result};
use std::collections::HashMap;
use tracing::debug;

fn nav(id: &str, title: &str, path: &str) -> Command {
    Command::new(
        id,
        title,
        CommandGroup::Navigation,
        CommandAction::Navigate(path.to_string()),
    )
}

fn logged(id: &str, title: &str, group: CommandGroup, message: &str) -> Command {
    Command::new(id, title, group, CommandAction::Log(message.to_string()))
}

#[must_use]
pub fn builtin_commands() -> Vec<Command> {
    vec![
        // --- Navigation ---
        nav("nav-dashboard", "Go to Dashboard", "/")
            .with_description("View your case overview and statistics")
            .with_keywords(["home", "overview", "main"])
            .with_shortcut("G D"),
        nav("nav-cases", "Go to Cases", "/cases")
            .with_description("Manage your legal cases")
            .with_keywords(["legal", "matters", "litigation"])
            .with_shortcut("G C"),
        nav("nav-calendar", "Go to Calendar", "/calendar")
            .with_description("View court dates and deadlines")
            .with_keywords(["schedule", "appointments", "court"])
            .with_shortcut("G L"),
        nav("nav-contacts", "Go to Contacts", "/contacts")
            .with_description("Manage legal contacts and relationships")
            .with_keywords(["people", "lawyers", "attorneys"])
            .with_shortcut("G O"),
        nav("nav-settings", "Go to Settings", "/settings")
            .with_description("Configure your account and preferences")
            .with_keywords(["config", "preferences", "account"])
            .with_shortcut("G S"),
        // --- Actions ---
        logged(
            "action-new-case",
            "Create New Case",
            CommandGroup::Actions,
            "Creating new case...",
        )
        .with_description("Start a new legal matter")
        .with_keywords(["add", "create", "new", "legal"])
        .with_shortcut("C"),
        logged(
            "action-ai-chat",
            "Chat with AI Assistant",
            CommandGroup::Actions,
            "Opening AI chat...",
        )
        .with_description("Get legal guidance and support")
        .with_keywords(["ai", "assistant", "help", "chat"])
        .with_shortcut("A"),
        logged(
            "action-quick-search",
            "Quick Search",
            CommandGroup::Actions,
            "Opening search...",
        )
        .with_description("Search across all your legal documents")
        .with_keywords(["find", "search", "documents", "files"])
        .with_shortcut("S"),
        // --- Help ---
        Command::new(
            "help-docs",
            "Documentation",
            CommandGroup::Help,
            CommandAction::Navigate("/help".to_string()),
        )
        .with_description("View user guide and help articles")
        .with_keywords(["docs", "guide", "manual", "support"])
        .with_shortcut("H"),
        logged(
            "help-shortcuts",
            "Keyboard Shortcuts",
            CommandGroup::Help,
            "Showing shortcuts...",
        )
        .with_description("View all available keyboard shortcuts")
        .with_keywords(["keys", "hotkeys", "commands"])
        .with_shortcut("?"),
    ]
}

/// Built-ins followed by `custom`, in that order.
#[must_use]
pub fn all_commands(custom: Vec<Command>) -> Vec<Command> {
    let mut commands = builtin_commands();
    commands.extend(custom);
    commands
}

/// The immutable command catalog, indexed by id.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: Vec<Command>,
    // First occurrence wins when duplicates are kept.
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new(custom: Vec<Command>, policy: DuplicatePolicy) -> Result<Self> {
        Self::from_commands(all_commands(custom), policy)
    }

    pub fn from_commands(commands: Vec<Command>, policy: DuplicatePolicy) -> Result<Self> {
        let mut index = HashMap::with_capacity(commands.len());
        for (i, cmd) in commands.iter().enumerate() {
            if index.contains_key(cmd.id()) {
                match policy {
                    DuplicatePolicy::Reject => {
                        return Err(PaletteError::DuplicateCommandId {
                            id: cmd.id().to_string(),
                        });
                    }
                    DuplicatePolicy::KeepBoth => {
                        debug!(id = cmd.id(), "keeping duplicate command id");
                        continue;
                    }
                }
            }
            index.insert(cmd.id().to_string(), i);
        }
        Ok(Self { commands, index })
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn get(&self, id: &str) -> Option<&Command> {
        self.index.get(id).map(|&i| &self.commands[i])
    }

    pub fn by_group(&self, group: CommandGroup) -> Vec<&Command> {
        self.commands.iter().filter(|c| c.group() == group).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
