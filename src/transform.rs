//! Skiller log to lookup entry pass
//!
//! Walks all start events, pairs them, filters the durations and writes new
//! entries. Out-of-range durations and duplicates are logged and counted; a
//! malformed skill string stops the pass.

use crate::error::Result;
use crate::lookup::{Candidate, InsertOutcome, LookupEntry, LookupEntryBuilder, LookupWriter};
use crate::pairing::{EventPairMatcher, PairOutcome};
use crate::store::{EventLog, LookupStore};

/// Counters of a finished transform pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    /// `Running` events examined
    pub starts: usize,
    pub paired: usize,
    pub unmatched: usize,
    pub non_terminal: usize,
    pub out_of_range: usize,
    pub duplicates: usize,
    /// Entries inserted, or that would be inserted in dry-run mode
    pub added: usize,
}

/// Run one pass over `log`
///
/// `on_added` sees every entry that was inserted (or would be, in dry-run
/// mode).
pub fn transform<L, S, F>(
    log: &L,
    builder: &LookupEntryBuilder,
    writer: &mut LookupWriter<'_, S>,
    mut on_added: F,
) -> Result<TransformReport>
where
    L: EventLog + ?Sized,
    S: LookupStore + ?Sized,
    F: FnMut(&LookupEntry),
{
    let matcher = EventPairMatcher::new(log);
    let mut report = TransformReport::default();

    for start in matcher.starts()? {
        report.starts += 1;
        let invocation = match matcher.resolve(&start)? {
            PairOutcome::Completed(invocation) => invocation,
            PairOutcome::Unmatched => {
                report.unmatched += 1;
                tracing::debug!(thread = %start.thread, timestamp = start.timestamp,
                    skill = %start.skill_string, "no end event");
                continue;
            }
            PairOutcome::NonTerminal(next) => {
                report.non_terminal += 1;
                tracing::debug!(thread = %start.thread, timestamp = start.timestamp,
                    next_status = %next.status, "next event does not end the invocation");
                continue;
            }
        };
        report.paired += 1;

        let entry = match builder.build(&invocation) {
            Candidate::Accepted(entry) => entry,
            Candidate::OutOfRange { duration, .. } => {
                report.out_of_range += 1;
                tracing::warn!(
                    duration,
                    thread = %invocation.start.thread,
                    start = invocation.start.timestamp,
                    end = invocation.end.timestamp,
                    skill = %invocation.skill,
                    "duration out of bounds, omitting"
                );
                continue;
            }
        };

        match writer.record(entry.clone())? {
            InsertOutcome::Duplicate => {
                report.duplicates += 1;
                tracing::info!(skill = %invocation.skill, "entry already present, omitting");
            }
            InsertOutcome::Inserted | InsertOutcome::Skipped => {
                report.added += 1;
                tracing::info!(
                    skill = %invocation.skill,
                    duration = %entry.duration,
                    "adding entry"
                );
                on_added(&entry);
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::DurationBounds;
    use crate::error::SkillTimeError;
    use crate::event::{SkillEvent, Status};
    use crate::lookup::EntryDuration;
    use crate::store::JsonlCollection;

    fn run(
        events: Vec<SkillEvent>,
        store: &mut JsonlCollection<LookupEntry>,
        bounds: DurationBounds,
        dry_run: bool,
    ) -> Result<TransformReport> {
        let log = JsonlCollection::from_documents(events);
        let mut writer = LookupWriter::new(store, dry_run);
        transform(&log, &LookupEntryBuilder::new(bounds), &mut writer, |_| {})
    }

    #[test]
    fn test_sub_second_pair_yields_zero_duration() {
        let mut store = JsonlCollection::in_memory();
        let report = run(
            vec![
                SkillEvent::new(1, 100, Status::Running, "foo{}"),
                SkillEvent::new(1, 350, Status::Final, "foo{}"),
            ],
            &mut store,
            DurationBounds::default(),
            false,
        )
        .unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(store.documents()[0].duration, EntryDuration::Seconds(0));
    }

    #[test]
    fn test_counts_every_start() {
        let mut store = JsonlCollection::in_memory();
        let report = run(
            vec![
                SkillEvent::new(1, 100, Status::Running, "foo{}"),
                SkillEvent::new(1, 200, Status::Running, "foo{}"),
                SkillEvent::new(1, 2700, Status::Final, "foo{}"),
                SkillEvent::new(2, 300, Status::Running, "bar{}"),
            ],
            &mut store,
            DurationBounds::default(),
            false,
        )
        .unwrap();
        assert_eq!(report.starts, 3);
        assert_eq!(report.non_terminal, 1);
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.paired, 1);
        assert_eq!(report.added, 1);
        assert_eq!(store.documents()[0].duration, EntryDuration::Seconds(2));
    }

    #[test]
    fn test_out_of_range_discarded() {
        let mut store = JsonlCollection::in_memory();
        let report = run(
            vec![
                SkillEvent::new(1, 0, Status::Running, "foo{}"),
                SkillEvent::new(1, 5_000, Status::Final, "foo{}"),
                SkillEvent::new(2, 0, Status::Running, "foo{}"),
                SkillEvent::new(2, 50_000, Status::Final, "foo{}"),
            ],
            &mut store,
            DurationBounds::new(10.0, 100.0).unwrap(),
            false,
        )
        .unwrap();
        assert_eq!(report.out_of_range, 1);
        assert_eq!(report.added, 1);
        assert_eq!(store.documents()[0].duration, EntryDuration::Seconds(50));
    }

    #[test]
    fn test_second_pass_adds_nothing() {
        let events = vec![
            SkillEvent::new(1, 100, Status::Running, r#"foo{a="1"}"#),
            SkillEvent::new(1, 3100, Status::Failed, r#"foo{a="1"}"#).with_error("lost"),
        ];
        let mut store = JsonlCollection::in_memory();
        let first = run(events.clone(), &mut store, DurationBounds::default(), false).unwrap();
        let second = run(events, &mut store, DurationBounds::default(), false).unwrap();
        assert_eq!(first.added, 1);
        assert_eq!(second.added, 0);
        assert_eq!(second.duplicates, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_dry_run_reports_without_writing() {
        let mut store = JsonlCollection::<LookupEntry>::in_memory();
        let log = JsonlCollection::from_documents(vec![
            SkillEvent::new(1, 100, Status::Running, "foo{}"),
            SkillEvent::new(1, 1100, Status::Final, "foo{}"),
        ]);
        let mut seen = Vec::new();
        let mut writer = LookupWriter::new(&mut store, true);
        let report = transform(&log, &LookupEntryBuilder::default(), &mut writer, |e| {
            seen.push(e.clone())
        })
        .unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(seen.len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_malformed_pair_aborts_pass() {
        let mut store = JsonlCollection::in_memory();
        let err = run(
            vec![
                SkillEvent::new(1, 100, Status::Running, "foo{}"),
                SkillEvent::new(1, 200, Status::Final, "foo{}"),
                SkillEvent::new(1, 300, Status::Running, "broken"),
                SkillEvent::new(1, 400, Status::Final, "broken"),
            ],
            &mut store,
            DurationBounds::default(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, SkillTimeError::MalformedSkillString { .. }));
        // entries written before the failure stay
        assert_eq!(store.len(), 1);
    }
}
