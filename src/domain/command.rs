use std::fmt;
use std::sync::Arc;

/// Host-supplied effect for [`CommandAction::Custom`].
pub type CustomAction = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CommandGroup {
    Navigation,
    Actions,
    Help,
    Custom,
}

impl CommandGroup {
    pub const ALL: [CommandGroup; 4] = [
        CommandGroup::Navigation,
        CommandGroup::Actions,
        CommandGroup::Help,
        CommandGroup::Custom,
    ];

    #[must_use]
    pub fn heading(self) -> &'static str {
        match self {
            CommandGroup::Navigation => "Navigation",
            CommandGroup::Actions => "Actions",
            CommandGroup::Help => "Help & Support",
            CommandGroup::Custom => "Custom",
        }
    }
}

/// A key binding attached to a command.
///
/// Only [`Shortcut::Key`] is ever matched against key events. Chords such as
/// `"G D"` are kept for display; nothing resolves them yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shortcut {
    Key(char),
    Chord(Vec<char>),
}

impl Shortcut {
    /// Parses `"C"` into a single key and `"G D"` into a chord.
    ///
    /// Returns `None` for empty input and for multi-character tokens, which
    /// neither form can express.
    #[must_use]
    pub fn parse(binding: &str) -> Option<Self> {
        let mut keys = Vec::new();
        for token in binding.split_whitespace() {
            let mut chars = token.chars();
            let key = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            keys.push(key);
        }
        match keys.as_slice() {
            [] => None,
            [key] => Some(Shortcut::Key(*key)),
            _ => Some(Shortcut::Chord(keys)),
        }
    }

    /// True when `key` is exactly one character equal to this single-key
    /// binding, ignoring case.
    #[must_use]
    pub fn matches_key(&self, key: &str) -> bool {
        let Shortcut::Key(bound) = self else {
            return false;
        };
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(pressed), None) => pressed.to_lowercase().eq(bound.to_lowercase()),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_chord(&self) -> bool {
        matches!(self, Shortcut::Chord(_))
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shortcut::Key(key) => write!(f, "{key}"),
            Shortcut::Chord(keys) => {
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{key}")?;
                }
                Ok(())
            }
        }
    }
}

/// What running a command does.
#[derive(Clone)]
pub enum CommandAction {
    /// Ask the router to go to a path.
    Navigate(String),
    /// Emit a message at info level.
    Log(String),
    Custom(CustomAction),
}

impl CommandAction {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        CommandAction::Custom(Arc::new(f))
    }
}

impl fmt::Debug for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandAction::Navigate(path) => f.debug_tuple("Navigate").field(path).finish(),
            CommandAction::Log(message) => f.debug_tuple("Log").field(message).finish(),
            CommandAction::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for CommandAction {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CommandAction::Navigate(a), CommandAction::Navigate(b)) => a == b,
            (CommandAction::Log(a), CommandAction::Log(b)) => a == b,
            (CommandAction::Custom(a), CommandAction::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// An invocable palette entry. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    id: String,
    title: String,
    description: Option<String>,
    group: CommandGroup,
    keywords: Vec<String>,
    shortcut: Option<Shortcut>,
    action: CommandAction,
}

impl Command {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        group: CommandGroup,
        action: CommandAction,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            group,
            keywords: Vec::new(),
            shortcut: None,
            action,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches a shortcut; an unparseable binding leaves the command unbound.
    #[must_use]
    pub fn with_shortcut(mut self, binding: &str) -> Self {
        self.shortcut = Shortcut::parse(binding);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn group(&self) -> CommandGroup {
        self.group
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn shortcut(&self) -> Option<&Shortcut> {
        self.shortcut.as_ref()
    }

    pub fn action(&self) -> &CommandAction {
        &self.action
    }

    /// Lowercased title, description and keywords joined by spaces.
    #[must_use]
    pub fn search_text(&self) -> String {
        let mut parts: Vec<&str> = vec![&self.title];
        if let Some(description) = &self.description {
            parts.push(description);
        }
        parts.extend(self.keywords.iter().map(String::as_str));
        parts.join(" ").to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_key_and_chord() {
        assert_eq!(Shortcut::parse("C"), Some(Shortcut::Key('C')));
        assert_eq!(Shortcut::parse("?"), Some(Shortcut::Key('?')));
        assert_eq!(Shortcut::parse("G D"), Some(Shortcut::Chord(vec!['G', 'D'])));
        assert_eq!(Shortcut::parse(""), None);
        assert_eq!(Shortcut::parse("Ctrl"), None);
    }

    #[test]
    fn test_matches_key_is_case_insensitive() {
        let shortcut = Shortcut::Key('C');
        assert!(shortcut.matches_key("c"));
        assert!(shortcut.matches_key("C"));
        assert!(!shortcut.matches_key("x"));
        assert!(!shortcut.matches_key("Escape"));
    }

    #[test]
    fn test_chords_never_match() {
        let chord = Shortcut::parse("G D").unwrap();
        assert!(chord.is_chord());
        assert!(!chord.matches_key("g"));
        assert!(!chord.matches_key("G D"));
        assert_eq!(chord.to_string(), "G D");
    }

    #[test]
    fn test_search_text_joins_fields() {
        let cmd = Command::new(
            "nav-cases",
            "Go to Cases",
            CommandGroup::Navigation,
            CommandAction::Navigate("/cases".to_string()),
        )
        .with_description("Manage your legal cases")
        .with_keywords(["Legal", "matters"]);

        assert_eq!(
            cmd.search_text(),
            "go to cases manage your legal cases legal matters"
        );
    }

    #[test]
    fn test_custom_actions_compare_by_identity() {
        let a = CommandAction::custom(|| Ok(()));
        let b = CommandAction::custom(|| Ok(()));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(format!("{a:?}"), "Custom(..)");
    }
}
