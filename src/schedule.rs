//! Scheduling index: start-time ordering and time-conflict detection.
//!
//! Every task or subtask with a start time is indexed by `(start, id)`,
//! which gives the prioritized view for free. Entries that also have a
//! duration occupy the half-open interval `[start, end)`; no two occupied
//! intervals may overlap. Epics are never indexed.

use std::collections::{BTreeSet, HashMap};

use chrono::{Duration, NaiveDateTime};

use crate::task::{end_time, TaskId};

/// Half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    /// Interval for a schedule, when both start and duration are known.
    pub fn from_schedule(start: Option<NaiveDateTime>, duration: Option<Duration>) -> Option<Self> {
        let start = start?;
        let end = end_time(Some(start), duration)?;
        Some(Self { start, end })
    }

    /// Back-to-back intervals do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default)]
pub struct Timeline {
    by_start: BTreeSet<(NaiveDateTime, TaskId)>,
    slots: HashMap<TaskId, Slot>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Id of an indexed entry overlapping `[start, start + duration)`.
    ///
    /// Candidates missing either half never conflict. The entry stored
    /// under `exclude` is skipped so an update is not checked against its
    /// own previous version.
    pub fn find_conflict(
        &self,
        start: Option<NaiveDateTime>,
        duration: Option<Duration>,
        exclude: Option<TaskId>,
    ) -> Option<TaskId> {
        let candidate = Interval::from_schedule(start, duration)?;

        // Anything starting at or after the candidate's end cannot overlap.
        self.by_start
            .range(..(candidate.end, TaskId::MIN))
            .filter(|(_, id)| Some(*id) != exclude)
            .find_map(|(start, id)| {
                let end = self.slots.get(id)?.end?;
                let existing = Interval { start: *start, end };
                existing.overlaps(&candidate).then_some(*id)
            })
    }

    /// Index (or re-index) an entry. Entries without a start are dropped.
    pub fn upsert(&mut self, id: TaskId, start: Option<NaiveDateTime>, duration: Option<Duration>) {
        self.remove(id);
        let Some(start) = start else {
            return;
        };
        let slot = Slot {
            start,
            end: end_time(Some(start), duration),
        };
        self.by_start.insert((start, id));
        self.slots.insert(id, slot);
    }

    pub fn remove(&mut self, id: TaskId) {
        if let Some(slot) = self.slots.remove(&id) {
            self.by_start.remove(&(slot.start, id));
        }
    }

    /// Indexed ids ordered by start time, ties by id.
    pub fn ordered_ids(&self) -> Vec<TaskId> {
        self.by_start.iter().map(|(_, id)| *id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 10)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn mins(value: i64) -> Option<Duration> {
        Some(Duration::minutes(value))
    }

    #[test]
    fn overlap_is_half_open() {
        let a = Interval { start: at(10, 0), end: at(11, 0) };
        let b = Interval { start: at(10, 30), end: at(11, 30) };
        let c = Interval { start: at(11, 0), end: at(11, 30) };
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn detects_overlap_with_indexed_entry() {
        let mut timeline = Timeline::new();
        timeline.upsert(1, Some(at(10, 0)), mins(60));

        assert_eq!(timeline.find_conflict(Some(at(10, 30)), mins(60), None), Some(1));
        assert_eq!(timeline.find_conflict(Some(at(9, 0)), mins(61), None), Some(1));
        assert_eq!(timeline.find_conflict(Some(at(11, 0)), mins(30), None), None);
        assert_eq!(timeline.find_conflict(Some(at(9, 0)), mins(60), None), None);
    }

    #[test]
    fn candidate_enclosing_an_entry_conflicts() {
        let mut timeline = Timeline::new();
        timeline.upsert(1, Some(at(10, 15)), mins(15));
        assert_eq!(timeline.find_conflict(Some(at(10, 0)), mins(60), None), Some(1));
    }

    #[test]
    fn unscheduled_candidates_never_conflict() {
        let mut timeline = Timeline::new();
        timeline.upsert(1, Some(at(10, 0)), mins(60));
        assert_eq!(timeline.find_conflict(None, mins(60), None), None);
        assert_eq!(timeline.find_conflict(Some(at(10, 0)), None, None), None);
    }

    #[test]
    fn entries_without_duration_are_ordered_but_never_conflict() {
        let mut timeline = Timeline::new();
        timeline.upsert(1, Some(at(10, 0)), None);
        assert_eq!(timeline.find_conflict(Some(at(9, 30)), mins(60), None), None);
        assert_eq!(timeline.ordered_ids(), vec![1]);
    }

    #[test]
    fn excluded_id_is_skipped() {
        let mut timeline = Timeline::new();
        timeline.upsert(1, Some(at(10, 0)), mins(60));
        assert_eq!(timeline.find_conflict(Some(at(10, 15)), mins(30), Some(1)), None);
        assert_eq!(timeline.find_conflict(Some(at(10, 15)), mins(30), Some(2)), Some(1));
    }

    #[test]
    fn upsert_moves_entry() {
        let mut timeline = Timeline::new();
        timeline.upsert(1, Some(at(12, 0)), mins(30));
        timeline.upsert(2, Some(at(10, 0)), mins(30));
        assert_eq!(timeline.ordered_ids(), vec![2, 1]);

        timeline.upsert(1, Some(at(8, 0)), mins(30));
        assert_eq!(timeline.ordered_ids(), vec![1, 2]);
        assert_eq!(timeline.len(), 2);

        timeline.upsert(1, None, mins(30));
        assert_eq!(timeline.ordered_ids(), vec![2]);
        assert!(!timeline.contains(1));
    }

    #[test]
    fn equal_starts_break_ties_by_id() {
        let mut timeline = Timeline::new();
        timeline.upsert(7, Some(at(9, 0)), None);
        timeline.upsert(3, Some(at(9, 0)), None);
        assert_eq!(timeline.ordered_ids(), vec![3, 7]);
    }
}
