//! Lookup entries and their persistence
//!
//! A lookup entry is the normalised record consumed by the execution-time
//! estimator: skill name, arguments, outcome and duration. Entries derived
//! from the log carry an identity `(thread, start_time, end_time)`;
//! synthetic entries have none.

use crate::duration::{elapsed_secs, DurationBounds};
use crate::error::Result;
use crate::event::{Status, ThreadId};
use crate::pairing::CompletedInvocation;
use crate::store::LookupStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Composite identity of a log-derived entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId {
    pub thread: ThreadId,
    pub start_time: i64,
    pub end_time: i64,
}

/// Duration in seconds, serialized as a bare number
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryDuration {
    /// Whole seconds measured from the log
    Seconds(u64),
    /// Value drawn from a duration distribution
    Sampled(f64),
}

impl EntryDuration {
    pub fn as_secs_f64(&self) -> f64 {
        match self {
            EntryDuration::Seconds(s) => *s as f64,
            EntryDuration::Sampled(s) => *s,
        }
    }
}

impl fmt::Display for EntryDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryDuration::Seconds(s) => write!(f, "{}s", s),
            EntryDuration::Sampled(s) => write!(f, "{:.3}s", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntryId>,
    pub outcome: Status,
    pub error: String,
    pub name: String,
    pub args: BTreeMap<String, String>,
    pub duration: EntryDuration,
}

impl LookupEntry {
    /// Entry for a sampled, always successful, invocation
    pub fn synthetic(
        name: impl Into<String>,
        args: BTreeMap<String, String>,
        duration: f64,
    ) -> Self {
        Self {
            id: None,
            outcome: Status::Final,
            error: String::new(),
            name: name.into(),
            args,
            duration: EntryDuration::Sampled(duration),
        }
    }
}

/// A built entry and whether its duration passed the bounds
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Accepted(LookupEntry),
    OutOfRange { duration: u64, entry: LookupEntry },
}

/// Turns completed invocations into lookup entries
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupEntryBuilder {
    bounds: DurationBounds,
}

impl LookupEntryBuilder {
    pub fn new(bounds: DurationBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> DurationBounds {
        self.bounds
    }

    pub fn build(&self, invocation: &CompletedInvocation) -> Candidate {
        let duration = elapsed_secs(invocation.start.timestamp, invocation.end.timestamp);
        let entry = LookupEntry {
            id: Some(EntryId {
                thread: invocation.start.thread.clone(),
                start_time: invocation.start.timestamp,
                end_time: invocation.end.timestamp,
            }),
            outcome: invocation.end.status,
            error: invocation.end.error.clone(),
            name: invocation.skill.name.clone(),
            args: invocation.skill.args.clone(),
            duration: EntryDuration::Seconds(duration),
        };
        if self.bounds.accepts(duration) {
            Candidate::Accepted(entry)
        } else {
            Candidate::OutOfRange { duration, entry }
        }
    }
}

/// Result of handing an entry to a [`LookupWriter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// An identical entry is already stored
    Duplicate,
    /// Dry run: the entry would have been inserted
    Skipped,
}

/// Writes entries to a [`LookupStore`], honouring dry-run mode
pub struct LookupWriter<'a, S: LookupStore + ?Sized> {
    store: &'a mut S,
    dry_run: bool,
}

impl<'a, S: LookupStore + ?Sized> LookupWriter<'a, S> {
    pub fn new(store: &'a mut S, dry_run: bool) -> Self {
        Self { store, dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Insert unless an identical entry already exists
    pub fn record(&mut self, entry: LookupEntry) -> Result<InsertOutcome> {
        if self.dry_run {
            return Ok(if self.store.find_one(&entry)?.is_some() {
                InsertOutcome::Duplicate
            } else {
                InsertOutcome::Skipped
            });
        }
        if self.store.insert_if_absent(entry)? {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::Duplicate)
        }
    }

    /// Insert without the duplicate check
    pub fn record_unchecked(&mut self, entry: LookupEntry) -> Result<InsertOutcome> {
        if self.dry_run {
            return Ok(InsertOutcome::Skipped);
        }
        self.store.insert_one(entry)?;
        Ok(InsertOutcome::Inserted)
    }

    /// Drop the destination collection; a no-op in dry-run mode
    pub fn drop_all(&mut self) -> Result<bool> {
        if self.dry_run {
            tracing::info!("dry run, keeping existing lookup entries");
            return Ok(false);
        }
        self.store.drop_collection()?;
        Ok(true)
    }
}
