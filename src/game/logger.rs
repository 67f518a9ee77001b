//! Game event log
//!
//! Every observable event goes through the `GameLogger` owned by the
//! `GameState`. The output mode decides whether a line is printed,
//! kept in memory as the per-game event log, or both. Entries sit in a
//! `RefCell` so controllers holding only a `GameStateView` can record
//! their choices.

use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::ops::Deref;

/// How much of the game to report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Nothing
    Silent = 0,
    /// Game start and result
    Minimal = 1,
    /// Turns, actions, combat and resolutions
    #[default]
    Normal = 2,
    /// Every mana payment, trigger check and state-based action
    Verbose = 3,
}

/// Where logged lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    #[default]
    Stdout,
    /// Kept in memory only; the simulation runner reads it back
    Memory,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
    /// "rejected" or "controller_choice" when set
    pub category: Option<String>,
}

/// Borrow of the captured entries
pub struct LogGuard<'a> {
    entries: Ref<'a, Vec<LogEntry>>,
}

impl Deref for LogGuard<'_> {
    type Target = [LogEntry];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

pub struct GameLogger {
    verbosity: VerbosityLevel,
    output_mode: OutputMode,
    entries: RefCell<Vec<LogEntry>>,
}

impl GameLogger {
    pub fn new() -> Self {
        Self::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        GameLogger {
            verbosity,
            output_mode: OutputMode::default(),
            entries: RefCell::new(Vec::new()),
        }
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    fn captures(&self) -> bool {
        matches!(self.output_mode, OutputMode::Memory | OutputMode::Both)
    }

    fn prints(&self) -> bool {
        matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both)
    }

    /// Every captured entry, whatever its level
    pub fn logs(&self) -> LogGuard<'_> {
        LogGuard {
            entries: self.entries.borrow(),
        }
    }

    /// Captured messages in order
    pub fn messages(&self) -> Vec<String> {
        self.entries.borrow().iter().map(|e| e.message.clone()).collect()
    }

    /// Captured messages at or below the current verbosity
    pub fn visible_messages(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.level <= self.verbosity)
            .map(|e| e.message.clone())
            .collect()
    }

    /// Messages of every refused intent so far
    pub fn rejections(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.category.as_deref() == Some("rejected"))
            .map(|e| e.message.clone())
            .collect()
    }

    fn log(&self, level: VerbosityLevel, message: &str, category: Option<&str>) {
        // Capture ignores verbosity so a quiet game still has a full record
        if self.captures() {
            self.entries.borrow_mut().push(LogEntry {
                level,
                message: message.to_string(),
                category: category.map(str::to_string),
            });
        }
        if self.prints() && level <= self.verbosity {
            match level {
                VerbosityLevel::Minimal => println!("{message}"),
                _ => println!("  {message}"),
            }
        }
    }

    #[inline]
    pub fn minimal(&self, message: &str) {
        self.log(VerbosityLevel::Minimal, message, None);
    }

    #[inline]
    pub fn normal(&self, message: &str) {
        self.log(VerbosityLevel::Normal, message, None);
    }

    #[inline]
    pub fn verbose(&self, message: &str) {
        self.log(VerbosityLevel::Verbose, message, None);
    }

    /// Record an illegal intent the engine refused
    pub fn rejected(&self, message: &str) {
        self.log(VerbosityLevel::Normal, &format!("rejected: {message}"), Some("rejected"));
    }

    /// Record a controller decision
    ///
    /// The controller name only appears at Verbose, so two controllers
    /// making the same choices leave the same Normal log.
    pub fn controller_choice(&self, controller_name: &str, message: &str) {
        let line = if self.verbosity >= VerbosityLevel::Verbose {
            format!("{controller_name}: {message}")
        } else {
            message.to_string()
        };
        self.log(VerbosityLevel::Normal, &line, Some("controller_choice"));
    }
}

impl Default for GameLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GameLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLogger")
            .field("verbosity", &self.verbosity)
            .field("output_mode", &self.output_mode)
            .field("entries", &self.entries.borrow().len())
            .finish()
    }
}

/// A clone keeps the settings and starts with an empty record
impl Clone for GameLogger {
    fn clone(&self) -> Self {
        GameLogger {
            verbosity: self.verbosity,
            output_mode: self.output_mode,
            entries: RefCell::new(Vec::new()),
        }
    }
}

/// Only the settings are part of a state snapshot
#[derive(Serialize, Deserialize)]
struct LoggerSettings {
    verbosity: VerbosityLevel,
    output_mode: OutputMode,
}

impl Serialize for GameLogger {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        LoggerSettings {
            verbosity: self.verbosity,
            output_mode: self.output_mode,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GameLogger {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let settings = LoggerSettings::deserialize(deserializer)?;
        let mut logger = GameLogger::with_verbosity(settings.verbosity);
        logger.output_mode = settings.output_mode;
        Ok(logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capturing(verbosity: VerbosityLevel) -> GameLogger {
        let mut logger = GameLogger::with_verbosity(verbosity);
        logger.set_output_mode(OutputMode::Memory);
        logger
    }

    #[test]
    fn test_defaults() {
        let logger = GameLogger::new();
        assert_eq!(logger.verbosity, VerbosityLevel::Normal);
        assert_eq!(logger.output_mode, OutputMode::Stdout);
    }

    #[test]
    fn test_stdout_mode_keeps_nothing() {
        let logger = GameLogger::with_verbosity(VerbosityLevel::Silent);
        logger.normal("Alice plays Mountain");
        assert!(logger.logs().is_empty());
    }

    #[test]
    fn test_capture_keeps_order_and_every_level() {
        let logger = capturing(VerbosityLevel::Minimal);
        logger.normal("Alice casts Lightning Bolt");
        logger.verbose("Alice pays {R}");
        logger.minimal("Alice wins (LifeTotal)");

        assert_eq!(
            logger.messages(),
            vec!["Alice casts Lightning Bolt", "Alice pays {R}", "Alice wins (LifeTotal)"]
        );
        assert_eq!(logger.visible_messages(), vec!["Alice wins (LifeTotal)"]);
    }

    #[test]
    fn test_rejections_are_categorized() {
        let logger = capturing(VerbosityLevel::Normal);
        logger.normal("Bob plays Forest");
        logger.rejected("Bob: no land plays left this turn");

        let logs = logger.logs();
        assert_eq!(logs[1].category.as_deref(), Some("rejected"));
        assert_eq!(logger.rejections(), vec!["rejected: Bob: no land plays left this turn"]);
    }

    #[test]
    fn test_controller_name_only_at_verbose() {
        let normal = capturing(VerbosityLevel::Normal);
        let verbose = capturing(VerbosityLevel::Verbose);
        normal.controller_choice("HEURISTIC", "keeps 7 cards");
        verbose.controller_choice("HEURISTIC", "keeps 7 cards");
        assert_eq!(normal.messages(), vec!["keeps 7 cards"]);
        assert_eq!(verbose.messages(), vec!["HEURISTIC: keeps 7 cards"]);
    }

    #[test]
    fn test_clone_and_snapshot_drop_entries() {
        let logger = capturing(VerbosityLevel::Verbose);
        logger.normal("only in the original");

        assert!(logger.clone().logs().is_empty());
        let json = serde_json::to_string(&logger).unwrap();
        let restored: GameLogger = serde_json::from_str(&json).unwrap();
        assert!(restored.logs().is_empty());
        assert_eq!(restored.output_mode, OutputMode::Memory);
        assert_eq!(restored.verbosity, VerbosityLevel::Verbose);
    }
}
