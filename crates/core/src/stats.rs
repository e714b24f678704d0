//! Statistics derived from a [`ProgressState`] on demand. Nothing here is stored.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};

use crate::model::{CurriculumId, CurriculumProgress, LessonId, ProgressState};

/// Lesson count of a curriculum when the catalog does not say otherwise.
pub const DEFAULT_LESSONS_PER_CURRICULUM: u32 = 30;

/// `completed / total * 100`, clamped to `[0, 100]`. A zero total yields 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn completion_percentage(completed: usize, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (completed as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Progress of one curriculum measured against its catalog length.
#[derive(Debug, Clone, PartialEq)]
pub struct CurriculumSummary {
    pub curriculum_id: CurriculumId,
    pub completed: usize,
    pub total: u32,
    pub percentage: f64,
    /// Lowest lesson in `1..=total` that is not completed yet.
    pub next_lesson: Option<LessonId>,
}

impl CurriculumSummary {
    #[must_use]
    pub fn from_progress(
        curriculum_id: CurriculumId,
        progress: &CurriculumProgress,
        total: u32,
    ) -> Self {
        let completed = progress.completed_count();
        let next_lesson = (1..=u64::from(total))
            .map(LessonId::new)
            .find(|lesson| !progress.is_completed(*lesson));

        Self {
            curriculum_id,
            completed,
            total,
            percentage: completion_percentage(completed, u64::from(total)),
            next_lesson,
        }
    }

    /// Every lesson of the curriculum has been completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.next_lesson.is_none()
    }
}

/// Number of consecutive calendar days with at least one completion.
///
/// The run must end `today`, or yesterday when nothing has been completed
/// today yet; otherwise the streak is broken and this returns 0.
#[must_use]
pub fn streak_days(state: &ProgressState, today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = state
        .records()
        .map(|(_, _, record)| record.completed_at().date_naive())
        .collect();

    let mut cursor = if days.contains(&today) {
        today
    } else {
        match today.checked_sub_days(Days::new(1)) {
            Some(yesterday) if days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0_u32;
    while days.contains(&cursor) {
        streak = streak.saturating_add(1);
        match cursor.checked_sub_days(Days::new(1)) {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    streak
}

/// Aggregate numbers for the statistics view.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    pub enrolled_curricula: usize,
    /// Sum of the lesson counts of enrolled curricula.
    pub total_lessons: u64,
    /// Completed lessons across every curriculum in the state.
    pub completed_lessons: usize,
    pub average_completion: f64,
    pub streak: u32,
}

impl ProgressStats {
    /// Compute stats for the given enrollments, each paired with its lesson count.
    #[must_use]
    pub fn compute(
        state: &ProgressState,
        enrolled: &[(CurriculumId, u32)],
        today: NaiveDate,
    ) -> Self {
        let total_lessons: u64 = enrolled.iter().map(|(_, total)| u64::from(*total)).sum();
        let completed_lessons = state.total_completed();

        Self {
            enrolled_curricula: enrolled.len(),
            total_lessons,
            completed_lessons,
            average_completion: completion_percentage(completed_lessons, total_lessons),
            streak: streak_days(state, today),
        }
    }
}
