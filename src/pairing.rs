//! Reconstruction of completed skill invocations from status events
//!
//! Every `Running` event opens a candidate invocation. Its end is the single
//! next event in the same thread with the identical skill string. Only that
//! one event is considered: if it is terminal (`Final` or `Failed`) the two
//! form a pair, otherwise the start is dropped, even when a terminal event
//! follows later. A restart of the same invocation therefore never pairs
//! with a stale start.

use crate::error::Result;
use crate::event::{SkillEvent, Status};
use crate::skill_string::{parse_skill_string, ParsedSkill};
use crate::store::{EventLog, EventQuery};

/// A start event matched with its terminal event
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedInvocation {
    pub start: SkillEvent,
    pub end: SkillEvent,
    pub skill: ParsedSkill,
}

/// What became of a single start event
#[derive(Debug, Clone, PartialEq)]
pub enum PairOutcome {
    Completed(CompletedInvocation),
    /// No later event with the same thread and skill string
    Unmatched,
    /// The next same-signature event does not end the invocation
    NonTerminal(SkillEvent),
}

/// Pairs start events with their terminal events over an [`EventLog`]
pub struct EventPairMatcher<'a, L: EventLog + ?Sized> {
    log: &'a L,
}

impl<'a, L: EventLog + ?Sized> EventPairMatcher<'a, L> {
    pub fn new(log: &'a L) -> Self {
        Self { log }
    }

    /// All `Running` events in ascending timestamp order
    pub fn starts(&self) -> Result<Vec<SkillEvent>> {
        self.log.find(&EventQuery::new().status(Status::Running))
    }

    /// The earliest later event sharing thread and skill string
    pub fn next_event(&self, start: &SkillEvent) -> Result<Option<SkillEvent>> {
        let query = EventQuery::new()
            .thread(start.thread.clone())
            .skill_string(start.skill_string.clone())
            .after(start.timestamp)
            .limit(1);
        Ok(self.log.find(&query)?.into_iter().next())
    }

    /// Resolve one start event
    ///
    /// The skill string is only parsed for accepted pairs; a malformed one
    /// is returned as an error and ends the pass.
    pub fn resolve(&self, start: &SkillEvent) -> Result<PairOutcome> {
        let Some(end) = self.next_event(start)? else {
            return Ok(PairOutcome::Unmatched);
        };
        if !end.status.is_terminal() {
            return Ok(PairOutcome::NonTerminal(end));
        }
        let skill = parse_skill_string(&start.skill_string)?;
        Ok(PairOutcome::Completed(CompletedInvocation {
            start: start.clone(),
            end,
            skill,
        }))
    }

    /// Resolve every start event in order, stopping at the first error
    pub fn resolve_all(&self) -> Result<Vec<(SkillEvent, PairOutcome)>> {
        let mut outcomes = Vec::new();
        for start in self.starts()? {
            let outcome = self.resolve(&start)?;
            outcomes.push((start, outcome));
        }
        Ok(outcomes)
    }

    /// Only the completed invocations
    pub fn completed(&self) -> Result<Vec<CompletedInvocation>> {
        Ok(self
            .resolve_all()?
            .into_iter()
            .filter_map(|(_, outcome)| match outcome {
                PairOutcome::Completed(invocation) => Some(invocation),
                _ => None,
            })
            .collect())
    }
}
