//! Interactive comparison session.
//!
//! A [`Session`] owns everything that changes while a user works through a
//! comparison: the active tab, the per-tab confirmation gate with its cached
//! diff, the focused surface and the generated SQL. It is driven by
//! [`Event`]s and answers each with a [`Notice`] for the message bar.
//!
//! Each event runs to completion (including its metadata queries) before
//! the next one is handled. Errors never escape [`Session::handle`]; they
//! become alerts and leave the session usable.

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::connection::Connection;
use crate::diff::diff_entities;
use crate::entity::{DiffEntry, EntityKey, EntityKind, GeneratedPatch};
use crate::error::{ReconcileError, Result};
use crate::patch::{PatchGenerator, PatchOptions};

/// Gate state of one tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TabState {
    /// Diff not computed yet; waiting for confirmation.
    #[default]
    Ungated,
    /// Diff computed and cached for the rest of the session.
    Gated(Vec<DiffEntry>),
}

/// Surface receiving navigation input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    /// The diff list.
    #[default]
    DiffList,
    /// The generated SQL.
    Sql,
}

impl Focus {
    fn toggled(self) -> Self {
        match self {
            Self::DiffList => Self::Sql,
            Self::Sql => Self::DiffList,
        }
    }
}

/// User actions understood by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Compute the diff of the active tab.
    Confirm,
    /// Generate SQL for a row (zero-based) of the active tab.
    SelectEntity(usize),
    /// Generate SQL for every row of the active tab not generated yet.
    GenerateAll,
    /// Activate a tab.
    SwitchTab(EntityKind),
    /// Activate the next tab.
    NextTab,
    /// Activate the previous tab.
    PreviousTab,
    /// Move focus between the diff list and the SQL surface.
    ToggleFocus,
}

/// Message produced by an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Nothing to report.
    None,
    /// Informational message.
    Info(String),
    /// Failure, scoped to the action that caused it.
    Alert(String),
}

/// State of one comparison between a reference and a comparison database.
pub struct Session<'c, C: Connection> {
    first: Catalog<'c, C>,
    second: Catalog<'c, C>,
    generator: PatchGenerator<'c, C>,
    tabs: [TabState; 6],
    active: EntityKind,
    focus: Focus,
    patches: Vec<GeneratedPatch>,
}

impl<'c, C: Connection> Session<'c, C> {
    /// Creates a session. Both connections must belong to the same dialect family.
    pub fn new(first: &'c C, second: &'c C, options: PatchOptions) -> Result<Self> {
        let generator = PatchGenerator::new(first, second, options)?;
        Ok(Self {
            first: Catalog::new(first),
            second: Catalog::new(second),
            generator,
            tabs: Default::default(),
            active: EntityKind::Tables,
            focus: Focus::DiffList,
            patches: Vec::new(),
        })
    }

    /// Active tab.
    pub fn active(&self) -> EntityKind {
        self.active
    }

    /// Focused surface.
    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Gate state of a tab.
    pub fn tab(&self, kind: EntityKind) -> &TabState {
        &self.tabs[kind.index()]
    }

    /// Returns whether the diff of a tab has been computed.
    pub fn is_gated(&self, kind: EntityKind) -> bool {
        matches!(self.tab(kind), TabState::Gated(_))
    }

    /// Cached diff of a tab; empty while the tab is ungated.
    pub fn rows(&self, kind: EntityKind) -> &[DiffEntry] {
        match self.tab(kind) {
            TabState::Gated(rows) => rows,
            TabState::Ungated => &[],
        }
    }

    /// Returns whether SQL has been generated for an entry.
    pub fn is_generated(&self, entry: &DiffEntry) -> bool {
        self.generator.is_generated(&entry.key())
    }

    /// Generated SQL for an entity, if any.
    pub fn patch(&self, key: &EntityKey) -> Option<&str> {
        self.generator.get(key)
    }

    /// Generated patches in generation order.
    pub fn patches(&self) -> &[GeneratedPatch] {
        &self.patches
    }

    /// Text of the SQL surface: every generated statement, in generation order.
    pub fn sql_text(&self) -> String {
        self.patches
            .iter()
            .map(|patch| patch.sql.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Handles one event to completion.
    pub async fn handle(&mut self, event: Event) -> Notice {
        let result = match event {
            Event::Confirm => self.confirm().await,
            Event::SelectEntity(row) => self.select(row).await,
            Event::GenerateAll => self.generate_all().await,
            Event::SwitchTab(kind) => {
                self.active = kind;
                Ok(Notice::None)
            }
            Event::NextTab => {
                self.active = self.active.next();
                Ok(Notice::None)
            }
            Event::PreviousTab => {
                self.active = self.active.previous();
                Ok(Notice::None)
            }
            Event::ToggleFocus => {
                self.focus = self.focus.toggled();
                Ok(Notice::None)
            }
        };

        match result {
            Ok(notice) => notice,
            Err(ReconcileError::InvalidSelection { .. }) => Notice::None,
            Err(err) => {
                warn!(kind = %self.active, error = %err, "Action failed");
                Notice::Alert(err.to_string())
            }
        }
    }

    async fn confirm(&mut self) -> Result<Notice> {
        let kind = self.active;
        if self.is_gated(kind) {
            return Ok(Notice::None);
        }

        let ours = self.first.entities(kind).await?;
        let theirs = self.second.entities(kind).await?;
        let rows = diff_entities(kind, &ours, &theirs);

        info!(kind = %kind, changes = rows.len(), "Computed diff");
        let message = format!("Found {} changes in {}.", rows.len(), kind);
        self.tabs[kind.index()] = TabState::Gated(rows);
        Ok(Notice::Info(message))
    }

    async fn select(&mut self, row: usize) -> Result<Notice> {
        let entry = self
            .rows(self.active)
            .get(row)
            .cloned()
            .ok_or(ReconcileError::InvalidSelection { row })?;
        if self.is_generated(&entry) {
            return Ok(Notice::None);
        }
        self.generate(&entry).await?;
        Ok(Notice::Info(format!(
            "Generated SQL for {}.",
            entry.display_name()
        )))
    }

    async fn generate_all(&mut self) -> Result<Notice> {
        let pending: Vec<DiffEntry> = self
            .rows(self.active)
            .iter()
            .filter(|entry| !self.is_generated(entry))
            .cloned()
            .collect();

        let mut done = 0;
        for entry in &pending {
            if let Err(err) = self.generate(entry).await {
                return Ok(Notice::Alert(format!(
                    "Generated SQL for {done} of {} entities, then: {err}",
                    pending.len()
                )));
            }
            done += 1;
        }

        Ok(match done {
            0 => Notice::None,
            _ => Notice::Info(format!("Generated SQL for {done} entities.")),
        })
    }

    async fn generate(&mut self, entry: &DiffEntry) -> Result<()> {
        let sql = self.generator.generate(entry).await?;
        self.patches.push(GeneratedPatch {
            key: entry.key(),
            sql,
        });
        Ok(())
    }
}
