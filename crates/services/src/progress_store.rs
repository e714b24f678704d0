use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use learn_core::codec;
use learn_core::model::{
    CompletionRecord, CurriculumId, CurriculumProgress, LessonId, ProgressState,
};
use storage::repository::KeyValueStore;
use tracing::{debug, error, info, warn};

use crate::Clock;
use crate::error::{HydrationError, ProgressStoreError};

/// Key under which the whole serialized `ProgressState` is stored.
pub const PROGRESS_KEY: &str = "progress";

/// Single source of truth for lesson completion.
///
/// Every mutation is written through to the key-value store before the call
/// returns. Write failures never roll back the in-memory state; the next
/// successful write carries the full state and reconciles storage.
pub struct ProgressStore {
    clock: Clock,
    kv: Arc<dyn KeyValueStore>,
    state: RwLock<ProgressState>,
}

impl ProgressStore {
    /// Load progress from storage.
    ///
    /// A missing record starts empty. An unreadable or unparsable record is
    /// logged and also starts empty.
    pub async fn initialize(clock: Clock, kv: Arc<dyn KeyValueStore>) -> Self {
        let state = match load_state(kv.as_ref()).await {
            Ok(Some(state)) => {
                info!(
                    curricula = state.curricula().count(),
                    lessons = state.total_completed(),
                    "progress restored"
                );
                state
            }
            Ok(None) => {
                debug!("no stored progress, starting empty");
                ProgressState::new()
            }
            Err(err) => {
                warn!(error = %err, "discarding stored progress, starting empty");
                ProgressState::new()
            }
        };

        Self {
            clock,
            kv,
            state: RwLock::new(state),
        }
    }

    /// Record `lesson_id` of `curriculum_id` as completed now.
    ///
    /// Re-marking refreshes the timestamp. Persistence failures are logged and
    /// swallowed; the lesson stays completed in memory.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError::InvalidCurriculum` or
    /// `ProgressStoreError::InvalidLesson` for a zero id.
    pub async fn mark_completed(
        &self,
        curriculum_id: CurriculumId,
        lesson_id: LessonId,
    ) -> Result<CompletionRecord, ProgressStoreError> {
        if curriculum_id.value() == 0 {
            return Err(ProgressStoreError::InvalidCurriculum(curriculum_id));
        }
        if lesson_id.value() == 0 {
            return Err(ProgressStoreError::InvalidLesson(lesson_id));
        }

        let record = CompletionRecord::new(self.clock.now());
        let encoded = {
            let mut state = self.write_state();
            let newly = state.mark(curriculum_id, lesson_id, record);
            debug!(%curriculum_id, %lesson_id, newly, "lesson marked completed");
            codec::encode(&state)
        };

        let persisted: Result<(), ProgressStoreError> = match encoded {
            Ok(raw) => self.kv.set(PROGRESS_KEY, &raw).await.map_err(Into::into),
            Err(err) => Err(ProgressStoreError::from(err)),
        };
        if let Err(err) = persisted {
            error!(
                error = %err,
                %curriculum_id,
                %lesson_id,
                "progress not persisted, keeping in-memory state"
            );
        }

        Ok(record)
    }

    /// Whether the exact pair has been completed. Unknown ids yield `false`.
    #[must_use]
    pub fn is_completed(&self, curriculum_id: CurriculumId, lesson_id: LessonId) -> bool {
        self.read_state().is_completed(curriculum_id, lesson_id)
    }

    /// Owned copy of one curriculum's progress; empty if nothing is completed.
    #[must_use]
    pub fn curriculum_progress(&self, curriculum_id: CurriculumId) -> CurriculumProgress {
        self.read_state()
            .curriculum(curriculum_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Owned copy of the whole state.
    #[must_use]
    pub fn snapshot(&self) -> ProgressState {
        self.read_state().clone()
    }

    /// Forget all progress and remove the stored record.
    ///
    /// The in-memory state is cleared even when the removal fails.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError::Persistence` if the stored record could
    /// not be removed.
    pub async fn reset(&self) -> Result<(), ProgressStoreError> {
        self.write_state().clear();

        if let Err(err) = self.kv.remove(PROGRESS_KEY).await {
            error!(error = %err, "stored progress not removed on reset");
            return Err(err.into());
        }

        info!("progress reset");
        Ok(())
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ProgressState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ProgressState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn load_state(kv: &dyn KeyValueStore) -> Result<Option<ProgressState>, HydrationError> {
    let Some(raw) = kv.get(PROGRESS_KEY).await? else {
        return Ok(None);
    };
    Ok(Some(codec::decode(&raw)?))
}
