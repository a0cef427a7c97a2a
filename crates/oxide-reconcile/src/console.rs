//! Line-oriented front end for a [`Session`].
//!
//! Reads one command per line, turns it into an [`Event`], and prints the
//! resulting notice, any newly generated SQL and the current tab.

use std::io::{self, BufRead, Write};

use crate::connection::Connection;
use crate::entity::EntityKind;
use crate::session::{Event, Focus, Notice, Session, TabState};

/// Help text listing every command.
pub const HELP: &str = "\
Commands:
  <Enter>, confirm      fetch changes for the current tab (prints SQL when focused on SQL)
  <n>, select <n>       generate SQL for row n
  a, all                generate SQL for every row of the current tab
  ], next               next tab
  [, prev               previous tab
  tab <name|n>          go to a tab
  f, focus              switch focus between the list and the SQL
  sql                   print all generated SQL
  h, ?, help            show this help
  q, quit               exit";

/// A parsed input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Bare Enter; meaning depends on focus.
    Enter,
    /// A session event.
    Event(Event),
    /// Print the SQL surface.
    ShowSql,
    /// Print the help text.
    Help,
    /// Leave the console.
    Quit,
}

/// Parses one input line.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, arg) = match line.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, Some(arg.trim())),
        None => (line, None),
    };

    let command = match (word.to_ascii_lowercase().as_str(), arg) {
        ("", None) => Command::Enter,
        ("confirm", None) => Command::Event(Event::Confirm),
        ("select", Some(row)) => Command::Event(Event::SelectEntity(parse_row(row)?)),
        ("a" | "all", None) => Command::Event(Event::GenerateAll),
        ("]" | "next", None) => Command::Event(Event::NextTab),
        ("[" | "prev", None) => Command::Event(Event::PreviousTab),
        ("tab", Some(target)) => Command::Event(Event::SwitchTab(parse_tab(target)?)),
        ("f" | "focus", None) => Command::Event(Event::ToggleFocus),
        ("sql", None) => Command::ShowSql,
        ("h" | "?" | "help", None) => Command::Help,
        ("q" | "quit", None) => Command::Quit,
        (row, None) if row.chars().all(|c| c.is_ascii_digit()) => {
            Command::Event(Event::SelectEntity(parse_row(row)?))
        }
        _ => return Err(format!("Unknown command '{line}'. Type 'help' for the list.")),
    };
    Ok(command)
}

/// Converts a 1-based row number into a row index.
fn parse_row(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("Rows are numbered from 1.".to_string()),
        Ok(n) => Ok(n - 1),
        Err(_) => Err(format!("'{value}' is not a row number.")),
    }
}

fn parse_tab(value: &str) -> Result<EntityKind, String> {
    let by_number = value
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(EntityKind::from_index);
    by_number
        .or_else(|| EntityKind::parse(value))
        .ok_or_else(|| format!("No tab named '{value}'."))
}

/// Tab bar with the active tab in brackets.
pub fn render_tab_bar<C: Connection>(session: &Session<'_, C>) -> String {
    EntityKind::ALL
        .iter()
        .map(|&kind| {
            if kind == session.active() {
                format!("[{}]", kind.title())
            } else {
                format!(" {} ", kind.title())
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Diff list of the active tab, or the confirmation prompt.
pub fn render_list<C: Connection>(session: &Session<'_, C>) -> String {
    let kind = session.active();
    match session.tab(kind) {
        TabState::Ungated => "Press Enter to fetch changes.".to_string(),
        TabState::Gated(rows) if rows.is_empty() => format!("No changes in {kind}."),
        TabState::Gated(rows) => rows
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let done = if session.is_generated(entry) { "  (generated)" } else { "" };
                format!(
                    "{:>4}. {} {}{}",
                    i + 1,
                    entry.change.marker(),
                    entry.display_name(),
                    done
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn prompt<C: Connection>(session: &Session<'_, C>) -> String {
    match session.focus() {
        Focus::DiffList => format!("{}> ", session.active()),
        Focus::Sql => format!("{} (sql)> ", session.active()),
    }
}

fn write_screen<C: Connection, W: Write>(session: &Session<'_, C>, out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", render_tab_bar(session))?;
    writeln!(out, "{}", render_list(session))?;
    Ok(())
}

fn write_sql<C: Connection, W: Write>(session: &Session<'_, C>, out: &mut W) -> io::Result<()> {
    if session.patches().is_empty() {
        writeln!(out, "No SQL generated yet.")
    } else {
        writeln!(out, "{}", session.sql_text())
    }
}

/// Runs the console until `quit` or end of input.
pub async fn run<C, R, W>(session: &mut Session<'_, C>, input: R, mut out: W) -> io::Result<()>
where
    C: Connection,
    R: BufRead,
    W: Write,
{
    write_screen(session, &mut out)?;
    write!(out, "{}", prompt(session))?;
    out.flush()?;

    for line in input.lines() {
        let line = line?;
        match parse_command(&line) {
            Err(message) => writeln!(out, "{message}")?,
            Ok(Command::Quit) => break,
            Ok(Command::Help) => writeln!(out, "{HELP}")?,
            Ok(Command::ShowSql) => write_sql(session, &mut out)?,
            Ok(Command::Enter) if session.focus() == Focus::Sql => write_sql(session, &mut out)?,
            Ok(command) => {
                let event = match command {
                    Command::Event(event) => event,
                    _ => Event::Confirm,
                };
                let before = session.patches().len();
                match session.handle(event).await {
                    Notice::None => {}
                    Notice::Info(message) => writeln!(out, "{message}")?,
                    Notice::Alert(message) => writeln!(out, "! {message}")?,
                }
                for patch in &session.patches()[before..] {
                    writeln!(out, "\n{}", patch.sql)?;
                }
                write_screen(session, &mut out)?;
            }
        }
        write!(out, "{}", prompt(session))?;
        out.flush()?;
    }
    writeln!(out)?;
    Ok(())
}
