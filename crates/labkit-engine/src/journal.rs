//! Session journal
//!
//! Append-only record of every action a session handled, guided or not.

use crate::action::Action;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying uuid
    #[inline]
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happened to a journaled action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EntryOutcome {
    /// Satisfied the current step
    Accepted,
    /// Did not satisfy the current step
    Rejected {
        /// Retry narration given to the user
        retry_narration: String,
    },
    /// Accepted without a procedure to check against
    FreePlay,
}

/// One journaled action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in the journal, from 0
    pub seq: u64,
    /// Wall-clock time the action was handled
    pub at: DateTime<Utc>,
    /// Step the action was checked against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_index: Option<usize>,
    /// The action
    pub action: Action,
    /// Verdict
    #[serde(flatten)]
    pub outcome: EntryOutcome,
}

/// Append-only action journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    session: SessionId,
    entries: Vec<JournalEntry>,
}

impl Journal {
    /// Create an empty journal for `session`
    #[must_use]
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            entries: Vec::new(),
        }
    }

    /// Append an entry stamped with the current time
    pub fn record(
        &mut self,
        step_index: Option<usize>,
        action: Action,
        outcome: EntryOutcome,
    ) -> &JournalEntry {
        let seq = self.entries.len() as u64;
        self.entries.push(JournalEntry {
            seq,
            at: Utc::now(),
            step_index,
            action,
            outcome,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Owning session
    #[inline]
    #[must_use]
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// All entries, oldest first
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was journaled
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count of rejected entries
    #[must_use]
    pub fn rejections(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, EntryOutcome::Rejected { .. }))
            .count()
    }

    /// Pretty JSON export
    ///
    /// # Errors
    /// Serialization errors from `serde_json`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_sequential() {
        let mut journal = Journal::new(SessionId::new());
        journal.record(Some(0), Action::select_tool("beaker"), EntryOutcome::Accepted);
        journal.record(
            Some(1),
            Action::Observe,
            EntryOutcome::Rejected {
                retry_narration: "Not quite. Add water.".into(),
            },
        );
        journal.record(None, Action::ApplyHeat, EntryOutcome::FreePlay);

        let seqs: Vec<u64> = journal.entries().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(journal.rejections(), 1);
        assert!(journal.entries()[0].at <= journal.entries()[2].at);
    }

    #[test]
    fn json_export() {
        let mut journal = Journal::new(SessionId::new());
        journal.record(Some(0), Action::add_resource("fe"), EntryOutcome::Accepted);
        let json: serde_json::Value = serde_json::from_str(&journal.to_json().unwrap()).unwrap();
        let entry = &json["entries"][0];
        assert_eq!(entry["outcome"], "accepted");
        assert_eq!(entry["action"]["kind"], "add_resource");
        assert_eq!(entry["action"]["resource_id"], "fe");
        assert_eq!(json["session"], journal.session().to_string());

        let back: Journal = serde_json::from_value(json).unwrap();
        assert_eq!(back, journal);
    }
}
