use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::catalog::{CurriculumCatalog, StaticCatalog};
use crate::error::AppServicesError;
use crate::progress_store::ProgressStore;
use crate::stats_service::ProgressStatsService;

/// Assembles app-facing services around one explicitly owned progress store.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressStore>,
    catalog: Arc<dyn CurriculumCatalog>,
    stats: Arc<ProgressStatsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        catalog: StaticCatalog,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock, Arc::new(catalog)).await)
    }

    /// Build services over a volatile in-memory store.
    pub async fn in_memory(clock: Clock, catalog: StaticCatalog) -> Self {
        Self::from_storage(Storage::in_memory(), clock, Arc::new(catalog)).await
    }

    /// Hydrate the progress store from `storage` and wire dependents to it.
    pub async fn from_storage(
        storage: Storage,
        clock: Clock,
        catalog: Arc<dyn CurriculumCatalog>,
    ) -> Self {
        let progress = Arc::new(ProgressStore::initialize(clock, Arc::clone(&storage.kv)).await);
        let stats = Arc::new(ProgressStatsService::new(
            clock,
            Arc::clone(&progress),
            Arc::clone(&catalog),
        ));

        Self {
            progress,
            catalog,
            stats,
        }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<dyn CurriculumCatalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<ProgressStatsService> {
        Arc::clone(&self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use learn_core::model::{CurriculumId, LessonId};
    use learn_core::time::fixed_clock;

    #[tokio::test]
    async fn services_share_one_store() {
        let services = AppServices::in_memory(
            fixed_clock(),
            StaticCatalog::new(30, vec![CurriculumId::new(1)]),
        )
        .await;

        services
            .progress()
            .mark_completed(CurriculumId::new(1), LessonId::new(1))
            .await
            .unwrap();

        assert!(services
            .progress()
            .is_completed(CurriculumId::new(1), LessonId::new(1)));
        assert_eq!(services.stats().overview().stats.completed_lessons, 1);
        assert_eq!(services.catalog().enrolled(), vec![CurriculumId::new(1)]);
    }
}
