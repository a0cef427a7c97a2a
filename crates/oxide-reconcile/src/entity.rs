//! Entity kinds, identifiers and diff entries.
//!
//! These types are shared by the catalog (which lists entities), the diff
//! engine (which classifies them) and the patch generator (which turns a
//! classified entity into DDL).

use std::fmt;

/// The six kinds of schema object the engine compares.
///
/// The declaration order is the tab order of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    /// Base tables.
    Tables,
    /// Columns of tables present on both sides.
    Columns,
    /// Views.
    Views,
    /// Stored procedures.
    Procedures,
    /// Stored functions.
    Functions,
    /// Triggers.
    Triggers,
}

impl EntityKind {
    /// All kinds in tab order.
    pub const ALL: [Self; 6] = [
        Self::Tables,
        Self::Columns,
        Self::Views,
        Self::Procedures,
        Self::Functions,
        Self::Triggers,
    ];

    /// Returns the zero-based tab index of this kind.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the kind at a tab index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns the next kind, wrapping around.
    #[must_use]
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Returns the previous kind, wrapping around.
    #[must_use]
    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Plural lowercase name, as shown in messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Tables => "tables",
            Self::Columns => "columns",
            Self::Views => "views",
            Self::Procedures => "procedures",
            Self::Functions => "functions",
            Self::Triggers => "triggers",
        }
    }

    /// Capitalized name, as shown in the tab bar.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Tables => "Tables",
            Self::Columns => "Columns",
            Self::Views => "Views",
            Self::Procedures => "Procedures",
            Self::Functions => "Functions",
            Self::Triggers => "Triggers",
        }
    }

    /// DDL object keyword (`DROP <keyword> ...`).
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Tables => "TABLE",
            Self::Columns => "COLUMN",
            Self::Views => "VIEW",
            Self::Procedures => "PROCEDURE",
            Self::Functions => "FUNCTION",
            Self::Triggers => "TRIGGER",
        }
    }

    /// Parses a kind from its plural or singular name (case-insensitive).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name || kind.name().trim_end_matches('s') == name)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification of an entity relative to the reference (first) side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Present on the reference side, absent on the comparison side.
    ToCreate,
    /// Present on the comparison side, absent on the reference side.
    ToDelete,
}

impl ChangeKind {
    /// One-character marker used in list rendering.
    #[must_use]
    pub fn marker(self) -> char {
        match self {
            Self::ToCreate => '+',
            Self::ToDelete => '-',
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ToCreate => "create",
            Self::ToDelete => "delete",
        })
    }
}

/// One entity as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityIdentifier {
    /// Entity name.
    pub name: String,
    /// Owning table, for columns and triggers.
    pub parent: Option<String>,
}

impl EntityIdentifier {
    /// Creates an identifier with no parent.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
        }
    }

    /// Creates a column identifier.
    #[must_use]
    pub fn column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: Some(table.into()),
        }
    }

    /// Sets the owning table.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// A classified difference between the two sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    /// Kind of the entity.
    pub kind: EntityKind,
    /// Entity name.
    pub name: String,
    /// Owning table, for columns and triggers.
    pub parent: Option<String>,
    /// Classification.
    pub change: ChangeKind,
}

impl DiffEntry {
    /// Creates a diff entry from a listed identifier.
    #[must_use]
    pub fn from_identifier(
        kind: EntityKind,
        identifier: &EntityIdentifier,
        change: ChangeKind,
    ) -> Self {
        Self {
            kind,
            name: identifier.name.clone(),
            parent: identifier.parent.clone(),
            change,
        }
    }

    /// Memoization key of this entry.
    #[must_use]
    pub fn key(&self) -> EntityKey {
        EntityKey {
            kind: self.kind,
            parent: match self.kind {
                EntityKind::Columns => self.parent.clone(),
                _ => None,
            },
            name: self.name.clone(),
        }
    }

    /// Name as displayed in a diff list (`table → column` for columns).
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.kind, &self.parent) {
            (EntityKind::Columns, Some(table)) => format!("{} → {}", table, self.name),
            _ => self.name.clone(),
        }
    }
}

/// Key under which a generated patch is memoized.
///
/// Columns are scoped by their table; every other kind by name alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    /// Entity kind.
    pub kind: EntityKind,
    /// Owning table (columns only).
    pub parent: Option<String>,
    /// Entity name.
    pub name: String,
}

/// DDL generated for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPatch {
    /// Entity the patch reconciles.
    pub key: EntityKey,
    /// Statement text, terminated by `;`.
    pub sql: String,
}
