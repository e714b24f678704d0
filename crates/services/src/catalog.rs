use learn_core::model::CurriculumId;
use learn_core::stats::DEFAULT_LESSONS_PER_CURRICULUM;

/// Curriculum metadata owned outside the progress store.
///
/// Lesson counts are only used to derive percentages; lesson ids are never
/// validated against them.
pub trait CurriculumCatalog: Send + Sync {
    /// Number of lessons in the curriculum.
    fn lesson_count(&self, curriculum_id: CurriculumId) -> u32;

    /// Curricula the current user is enrolled in.
    fn enrolled(&self) -> Vec<CurriculumId>;
}

/// Catalog where every curriculum has the same length.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    lessons_per_curriculum: u32,
    enrolled: Vec<CurriculumId>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new(lessons_per_curriculum: u32, enrolled: Vec<CurriculumId>) -> Self {
        let mut enrolled = enrolled;
        enrolled.sort();
        enrolled.dedup();
        Self {
            lessons_per_curriculum,
            enrolled,
        }
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_LESSONS_PER_CURRICULUM, Vec::new())
    }
}

impl CurriculumCatalog for StaticCatalog {
    fn lesson_count(&self, _curriculum_id: CurriculumId) -> u32 {
        self.lessons_per_curriculum
    }

    fn enrolled(&self) -> Vec<CurriculumId> {
        self.enrolled.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_thirty_lessons() {
        let catalog = StaticCatalog::default();
        assert_eq!(catalog.lesson_count(CurriculumId::new(7)), 30);
        assert!(catalog.enrolled().is_empty());
    }

    #[test]
    fn enrolled_ids_are_sorted_and_unique() {
        let catalog = StaticCatalog::new(
            10,
            vec![CurriculumId::new(3), CurriculumId::new(1), CurriculumId::new(3)],
        );
        assert_eq!(
            catalog.enrolled(),
            vec![CurriculumId::new(1), CurriculumId::new(3)]
        );
    }
}
