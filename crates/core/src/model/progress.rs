use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound, Utc};

use crate::model::{CurriculumId, LessonId};

/// Marks a lesson as completed at a point in time.
///
/// Re-marking a lesson replaces the record; the lesson stays completed.
/// Timestamps are kept at millisecond precision, the precision they are
/// persisted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionRecord {
    completed_at: DateTime<Utc>,
}

impl CompletionRecord {
    #[must_use]
    pub fn new(completed_at: DateTime<Utc>) -> Self {
        Self {
            completed_at: completed_at.trunc_subsecs(3),
        }
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

/// Completed lessons of a single curriculum.
///
/// A lesson is completed iff it has a record here; there is no "incomplete"
/// marker. Values handed out by the store are owned copies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurriculumProgress {
    lessons: BTreeMap<LessonId, CompletionRecord>,
}

impl CurriculumProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_completed(&self, lesson_id: LessonId) -> bool {
        self.lessons.contains_key(&lesson_id)
    }

    #[must_use]
    pub fn record(&self, lesson_id: LessonId) -> Option<&CompletionRecord> {
        self.lessons.get(&lesson_id)
    }

    /// Number of distinct completed lessons.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.lessons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    /// Completed lessons in ascending lesson order.
    pub fn lessons(&self) -> impl Iterator<Item = (LessonId, &CompletionRecord)> {
        self.lessons.iter().map(|(id, record)| (*id, record))
    }

    /// Insert or overwrite the record for `lesson_id`.
    ///
    /// Returns `true` if the lesson was not completed before.
    pub fn mark(&mut self, lesson_id: LessonId, record: CompletionRecord) -> bool {
        self.lessons.insert(lesson_id, record).is_none()
    }
}

/// Completion state of every curriculum for the current user and device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressState {
    curricula: BTreeMap<CurriculumId, CurriculumProgress>,
}

impl ProgressState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_completed(&self, curriculum_id: CurriculumId, lesson_id: LessonId) -> bool {
        self.curricula
            .get(&curriculum_id)
            .is_some_and(|progress| progress.is_completed(lesson_id))
    }

    #[must_use]
    pub fn curriculum(&self, curriculum_id: CurriculumId) -> Option<&CurriculumProgress> {
        self.curricula.get(&curriculum_id)
    }

    /// Curricula that have at least one completed lesson.
    pub fn curricula(&self) -> impl Iterator<Item = (CurriculumId, &CurriculumProgress)> {
        self.curricula.iter().map(|(id, progress)| (*id, progress))
    }

    /// Every completion record, curriculum by curriculum.
    pub fn records(&self) -> impl Iterator<Item = (CurriculumId, LessonId, &CompletionRecord)> {
        self.curricula.iter().flat_map(|(curriculum_id, progress)| {
            progress
                .lessons()
                .map(move |(lesson_id, record)| (*curriculum_id, lesson_id, record))
        })
    }

    /// Insert or overwrite a completion record.
    ///
    /// Returns `true` if the lesson was not completed before.
    pub fn mark(
        &mut self,
        curriculum_id: CurriculumId,
        lesson_id: LessonId,
        record: CompletionRecord,
    ) -> bool {
        self.curricula
            .entry(curriculum_id)
            .or_default()
            .mark(lesson_id, record)
    }

    /// Attach a whole curriculum; empty progress is dropped.
    pub fn insert_curriculum(&mut self, curriculum_id: CurriculumId, progress: CurriculumProgress) {
        if progress.is_empty() {
            self.curricula.remove(&curriculum_id);
        } else {
            self.curricula.insert(curriculum_id, progress);
        }
    }

    pub fn clear(&mut self) {
        self.curricula.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.curricula.is_empty()
    }

    /// Completed lessons across all curricula.
    #[must_use]
    pub fn total_completed(&self) -> usize {
        self.curricula
            .values()
            .map(CurriculumProgress::completed_count)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn ids(c: u64, l: u64) -> (CurriculumId, LessonId) {
        (CurriculumId::new(c), LessonId::new(l))
    }

    #[test]
    fn marking_is_idempotent_in_effect() {
        let mut state = ProgressState::new();
        let (c, l) = ids(1, 1);

        assert!(state.mark(c, l, CompletionRecord::new(fixed_now())));
        let later = fixed_now() + Duration::minutes(5);
        assert!(!state.mark(c, l, CompletionRecord::new(later)));

        let progress = state.curriculum(c).unwrap();
        assert_eq!(progress.completed_count(), 1);
        assert_eq!(progress.record(l).unwrap().completed_at(), later);
    }

    #[test]
    fn records_keep_millisecond_precision() {
        let record = CompletionRecord::new(fixed_now() + Duration::nanoseconds(123_456_789));
        assert_eq!(
            record.completed_at(),
            fixed_now() + Duration::milliseconds(123)
        );
    }

    #[test]
    fn lookups_are_scoped_to_curriculum() {
        let mut state = ProgressState::new();
        let (c, l) = ids(1, 1);
        state.mark(c, l, CompletionRecord::new(fixed_now()));
        state.mark(c, LessonId::new(2), CompletionRecord::new(fixed_now()));

        assert!(state.is_completed(c, l));
        assert!(!state.is_completed(c, LessonId::new(3)));
        assert!(!state.is_completed(CurriculumId::new(2), l));
        assert!(state.curriculum(CurriculumId::new(2)).is_none());
        assert_eq!(state.total_completed(), 2);
    }

    #[test]
    fn records_flatten_all_curricula() {
        let mut state = ProgressState::new();
        state.mark(CurriculumId::new(2), LessonId::new(1), CompletionRecord::new(fixed_now()));
        state.mark(CurriculumId::new(1), LessonId::new(4), CompletionRecord::new(fixed_now()));

        let keys: Vec<_> = state.records().map(|(c, l, _)| (c.value(), l.value())).collect();
        assert_eq!(keys, vec![(1, 4), (2, 1)]);
    }

    #[test]
    fn empty_curricula_are_not_kept() {
        let mut state = ProgressState::new();
        state.insert_curriculum(CurriculumId::new(9), CurriculumProgress::new());
        assert!(state.is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let mut state = ProgressState::new();
        let (c, l) = ids(3, 7);
        state.mark(c, l, CompletionRecord::new(fixed_now()));
        state.clear();
        assert!(!state.is_completed(c, l));
        assert_eq!(state.total_completed(), 0);
    }
}
