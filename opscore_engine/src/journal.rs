use candid::CandidType;
use chrono::Utc;
use serde::Deserialize;

use crate::utils::error::EngineResult;

/// Journal entry
#[derive(Clone, CandidType, Debug, Deserialize, PartialEq)]
pub struct JournalEntry {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub entry: EngineResult<()>,
    pub log_type: LogType,
    /// Id of the rule, strategy, bucket or task the entry is about
    pub subject: Option<String>,
    pub note: Option<String>,
}

#[derive(Clone, Copy, CandidType, Debug, Deserialize, PartialEq, Eq)]
pub enum LogType {
    Info,
    /// A dispatched action changed the configuration
    ConfigChange,
    /// Advisory findings of the consistency checks
    Validation,
    /// A request context was resolved to a strategy
    Resolution,
}

/// Builder for journal entries
impl JournalEntry {
    /// Create a new instance of a journal entry
    /// Fills the `timestamp`, `entry` and `log_type` fields
    pub fn new(entry: EngineResult<()>, log_type: LogType) -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis(),
            entry,
            log_type,
            subject: None,
            note: None,
        }
    }

    /// Fills the `subject` field of the entry
    pub fn subject<S: AsRef<str>>(&mut self, id: S) -> &mut Self {
        self.subject = Some(id.as_ref().to_string());
        self
    }

    /// Fills the `note` field of the entry
    pub fn note<S: AsRef<str>>(&mut self, text: S) -> &mut Self {
        self.note = Some(text.as_ref().to_string());
        self
    }

    /// Appends the entry to `journal`
    pub fn commit(&mut self, journal: &mut JournalCollection) {
        journal.entries.push(self.clone());
    }
}

/// Ordered in-memory journal, oldest entry first
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JournalCollection {
    entries: Vec<JournalEntry>,
}

impl JournalCollection {
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends a note without a subject
    pub fn append_note<S: AsRef<str>>(
        &mut self,
        result: EngineResult<()>,
        log_type: LogType,
        note: S,
    ) -> &mut Self {
        JournalEntry::new(result, log_type).note(note).commit(self);
        self
    }

    /// Appends a note about a specific subject
    pub fn append_subject_note<I: AsRef<str>, S: AsRef<str>>(
        &mut self,
        result: EngineResult<()>,
        log_type: LogType,
        subject: I,
        note: S,
    ) -> &mut Self {
        JournalEntry::new(result, log_type)
            .subject(subject)
            .note(note)
            .commit(self);
        self
    }

    /// Removes the oldest entries until at most `max` remain
    pub fn trim(&mut self, max: usize) {
        if self.entries.len() > max {
            let excess = self.entries.len() - max;
            self.entries.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::EngineError;

    #[test]
    fn test_entry_builder() {
        let mut journal = JournalCollection::default();
        JournalEntry::new(Err(EngineError::NonExistentValue), LogType::ConfigChange)
            .subject("rule_9")
            .note("Toggle failed.")
            .commit(&mut journal);

        let entry = &journal.entries()[0];
        assert_eq!(entry.entry, Err(EngineError::NonExistentValue));
        assert_eq!(entry.log_type, LogType::ConfigChange);
        assert_eq!(entry.subject.as_deref(), Some("rule_9"));
        assert_eq!(entry.note.as_deref(), Some("Toggle failed."));
        assert!(entry.timestamp > 0);
    }

    #[test]
    fn test_trim_keeps_most_recent() {
        let mut journal = JournalCollection::default();
        for index in 0..10 {
            journal.append_note(Ok(()), LogType::Info, format!("entry {}", index));
        }

        journal.trim(3);
        let notes: Vec<_> = journal
            .entries()
            .iter()
            .filter_map(|entry| entry.note.as_deref())
            .collect();
        assert_eq!(notes, vec!["entry 7", "entry 8", "entry 9"]);

        journal.trim(5);
        assert_eq!(journal.len(), 3);
    }
}
