use crate::stats::{CurriculumSummary, ProgressStats};

/// Milestones shown on the statistics view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Achievement {
    FirstLesson,
    FiveDayStreak,
    TenDayStreak,
    SkillMaster,
}

impl Achievement {
    pub const ALL: [Achievement; 4] = [
        Achievement::FirstLesson,
        Achievement::FiveDayStreak,
        Achievement::TenDayStreak,
        Achievement::SkillMaster,
    ];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Achievement::FirstLesson => "First Lesson",
            Achievement::FiveDayStreak => "5-Day Streak",
            Achievement::TenDayStreak => "10-Day Streak",
            Achievement::SkillMaster => "Skill Master",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Achievement::FirstLesson => "Completed your first lesson",
            Achievement::FiveDayStreak => "Learned for 5 consecutive days",
            Achievement::TenDayStreak => "Learned for 10 consecutive days",
            Achievement::SkillMaster => "Completed an entire skill curriculum",
        }
    }

    #[must_use]
    pub fn is_unlocked(self, stats: &ProgressStats, curricula: &[CurriculumSummary]) -> bool {
        match self {
            Achievement::FirstLesson => stats.completed_lessons >= 1,
            Achievement::FiveDayStreak => stats.streak >= 5,
            Achievement::TenDayStreak => stats.streak >= 10,
            Achievement::SkillMaster => curricula.iter().any(CurriculumSummary::is_complete),
        }
    }

    /// Achievements unlocked by the given stats, in display order.
    #[must_use]
    pub fn unlocked(stats: &ProgressStats, curricula: &[CurriculumSummary]) -> Vec<Achievement> {
        Self::ALL
            .into_iter()
            .filter(|achievement| achievement.is_unlocked(stats, curricula))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CurriculumId, LessonId};

    fn stats(completed: usize, streak: u32) -> ProgressStats {
        ProgressStats {
            enrolled_curricula: 1,
            total_lessons: 30,
            completed_lessons: completed,
            average_completion: 0.0,
            streak,
        }
    }

    fn summary(completed: usize, next: Option<u64>) -> CurriculumSummary {
        CurriculumSummary {
            curriculum_id: CurriculumId::new(1),
            completed,
            total: 30,
            percentage: 0.0,
            next_lesson: next.map(LessonId::new),
        }
    }

    #[test]
    fn nothing_unlocked_for_a_new_user() {
        assert!(Achievement::unlocked(&stats(0, 0), &[]).is_empty());
    }

    #[test]
    fn streak_thresholds() {
        let unlocked = Achievement::unlocked(&stats(6, 5), &[summary(6, Some(7))]);
        assert_eq!(
            unlocked,
            vec![Achievement::FirstLesson, Achievement::FiveDayStreak]
        );

        let unlocked = Achievement::unlocked(&stats(12, 10), &[]);
        assert!(unlocked.contains(&Achievement::TenDayStreak));
    }

    #[test]
    fn skill_master_needs_a_finished_curriculum() {
        let unlocked = Achievement::unlocked(&stats(30, 1), &[summary(30, None)]);
        assert!(unlocked.contains(&Achievement::SkillMaster));
        assert_eq!(Achievement::SkillMaster.title(), "Skill Master");
    }
}
