use std::sync::Arc;

use learn_core::Achievement;
use learn_core::model::CurriculumId;
use learn_core::stats::{CurriculumSummary, ProgressStats};

use crate::Clock;
use crate::catalog::CurriculumCatalog;
use crate::progress_store::ProgressStore;

/// Everything the statistics view renders, computed from one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressOverview {
    pub stats: ProgressStats,
    pub curricula: Vec<CurriculumSummary>,
    pub achievements: Vec<Achievement>,
}

/// Derives statistics from the progress store on demand.
#[derive(Clone)]
pub struct ProgressStatsService {
    clock: Clock,
    progress: Arc<ProgressStore>,
    catalog: Arc<dyn CurriculumCatalog>,
}

impl ProgressStatsService {
    #[must_use]
    pub fn new(
        clock: Clock,
        progress: Arc<ProgressStore>,
        catalog: Arc<dyn CurriculumCatalog>,
    ) -> Self {
        Self {
            clock,
            progress,
            catalog,
        }
    }

    /// Progress of a single curriculum against its catalog length.
    #[must_use]
    pub fn curriculum_summary(&self, curriculum_id: CurriculumId) -> CurriculumSummary {
        let progress = self.progress.curriculum_progress(curriculum_id);
        CurriculumSummary::from_progress(
            curriculum_id,
            &progress,
            self.catalog.lesson_count(curriculum_id),
        )
    }

    /// Stats, per-curriculum summaries and unlocked achievements.
    ///
    /// Summaries cover enrolled curricula plus any curriculum with progress.
    #[must_use]
    pub fn overview(&self) -> ProgressOverview {
        let state = self.progress.snapshot();
        let enrolled: Vec<(CurriculumId, u32)> = self
            .catalog
            .enrolled()
            .into_iter()
            .map(|id| (id, self.catalog.lesson_count(id)))
            .collect();

        let stats = ProgressStats::compute(&state, &enrolled, self.clock.today());

        let mut ids: Vec<CurriculumId> = enrolled.iter().map(|(id, _)| *id).collect();
        ids.extend(state.curricula().map(|(id, _)| id));
        ids.sort();
        ids.dedup();

        let curricula: Vec<CurriculumSummary> = ids
            .into_iter()
            .map(|id| {
                let progress = state.curriculum(id).cloned().unwrap_or_default();
                CurriculumSummary::from_progress(id, &progress, self.catalog.lesson_count(id))
            })
            .collect();

        let achievements = Achievement::unlocked(&stats, &curricula);

        ProgressOverview {
            stats,
            curricula,
            achievements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use learn_core::model::LessonId;
    use learn_core::time::fixed_clock;
    use storage::repository::InMemoryKeyValueStore;

    use crate::catalog::StaticCatalog;

    async fn service_with(
        lessons: u32,
        enrolled: &[u64],
    ) -> (ProgressStatsService, Arc<ProgressStore>) {
        let store = Arc::new(
            ProgressStore::initialize(fixed_clock(), Arc::new(InMemoryKeyValueStore::new())).await,
        );
        let catalog = StaticCatalog::new(
            lessons,
            enrolled.iter().copied().map(CurriculumId::new).collect(),
        );
        let service =
            ProgressStatsService::new(fixed_clock(), Arc::clone(&store), Arc::new(catalog));
        (service, store)
    }

    #[tokio::test]
    async fn overview_for_new_user() {
        let (service, _) = service_with(30, &[1, 2]).await;
        let overview = service.overview();

        assert_eq!(overview.stats.enrolled_curricula, 2);
        assert_eq!(overview.stats.total_lessons, 60);
        assert_eq!(overview.stats.completed_lessons, 0);
        assert_eq!(overview.curricula.len(), 2);
        assert_eq!(overview.curricula[0].next_lesson, Some(LessonId::new(1)));
        assert!(overview.achievements.is_empty());
    }

    #[tokio::test]
    async fn finishing_a_curriculum_unlocks_skill_master() {
        let (service, store) = service_with(3, &[1]).await;
        for lesson in 1..=3 {
            store
                .mark_completed(CurriculumId::new(1), LessonId::new(lesson))
                .await
                .unwrap();
        }

        let overview = service.overview();
        assert!((overview.stats.average_completion - 100.0).abs() < f64::EPSILON);
        assert_eq!(overview.stats.streak, 1);
        assert_eq!(
            overview.achievements,
            vec![Achievement::FirstLesson, Achievement::SkillMaster]
        );
    }

    #[tokio::test]
    async fn streak_spans_stores_on_consecutive_days() {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        for day in 0..5 {
            let clock = fixed_clock().advanced(Duration::days(day));
            let store = ProgressStore::initialize(clock, kv.clone()).await;
            store
                .mark_completed(CurriculumId::new(1), LessonId::new(u64::try_from(day).unwrap() + 1))
                .await
                .unwrap();
        }

        let today = fixed_clock().advanced(Duration::days(4));
        let store = Arc::new(ProgressStore::initialize(today, kv).await);
        let service = ProgressStatsService::new(
            today,
            Arc::clone(&store),
            Arc::new(StaticCatalog::new(30, vec![CurriculumId::new(1)])),
        );

        let overview = service.overview();
        assert_eq!(overview.stats.streak, 5);
        assert!(overview.achievements.contains(&Achievement::FiveDayStreak));
        assert!(!overview.achievements.contains(&Achievement::TenDayStreak));
    }

    #[tokio::test]
    async fn summaries_include_unenrolled_progress() {
        let (service, store) = service_with(30, &[1]).await;
        store
            .mark_completed(CurriculumId::new(9), LessonId::new(15))
            .await
            .unwrap();

        let overview = service.overview();
        let ids: Vec<u64> = overview
            .curricula
            .iter()
            .map(|s| s.curriculum_id.value())
            .collect();
        assert_eq!(ids, vec![1, 9]);

        let summary = service.curriculum_summary(CurriculumId::new(9));
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.next_lesson, Some(LessonId::new(1)));
    }
}
