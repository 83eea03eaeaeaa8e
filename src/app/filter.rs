use crate::domain::command::{Command, CommandGroup};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SectionKind {
    Recent,
    Group(CommandGroup),
}

impl SectionKind {
    #[must_use]
    pub fn heading(self) -> &'static str {
        match self {
            SectionKind::Recent => "Recent",
            SectionKind::Group(group) => group.heading(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section<'a> {
    pub kind: SectionKind,
    pub commands: Vec<&'a Command>,
}

/// Commands to display, grouped in section order. Empty sections are omitted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterResult<'a> {
    pub sections: Vec<Section<'a>>,
}

impl<'a> FilterResult<'a> {
    /// Every displayed row in order. Recent entries also appear in their group.
    pub fn flatten(&self) -> Vec<&'a Command> {
        self.sections
            .iter()
            .flat_map(|section| section.commands.iter().copied())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sections.iter().map(|s| s.commands.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Commands whose title, description or keywords contain `query`, ignoring
/// case, in their original order. A blank query matches everything; any other
/// query is matched literally, surrounding spaces included.
#[must_use]
pub fn matching<'a>(query: &str, commands: &'a [Command]) -> Vec<&'a Command> {
    if query.trim().is_empty() {
        return commands.iter().collect();
    }
    let query = query.to_lowercase();
    commands
        .iter()
        .filter(|cmd| cmd.search_text().contains(&query))
        .collect()
}

/// Builds the palette's grouped view.
///
/// A blank query lists `recent` first and then every command by group. A
/// non-blank query lists only matches, by group, with no recent section.
#[must_use]
pub fn filter<'a>(query: &str, commands: &'a [Command], recent: &[&'a Command]) -> FilterResult<'a> {
    let blank = query.trim().is_empty();
    let matches = matching(query, commands);

    let mut sections = Vec::new();
    if blank && !recent.is_empty() {
        sections.push(Section {
            kind: SectionKind::Recent,
            commands: recent.to_vec(),
        });
    }
    for group in CommandGroup::ALL {
        let in_group: Vec<&Command> = matches
            .iter()
            .copied()
            .filter(|cmd| cmd.group() == group)
            .collect();
        if !in_group.is_empty() {
            sections.push(Section {
                kind: SectionKind::Group(group),
                commands: in_group,
            });
        }
    }
    FilterResult { sections }
}
