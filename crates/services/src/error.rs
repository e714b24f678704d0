//! Shared error types for the services crate.

use thiserror::Error;

use learn_core::ProgressCodecError;
use learn_core::model::{CurriculumId, LessonId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Stored progress could not be loaded at startup.
///
/// Never returned to callers; the store logs it and starts empty.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HydrationError {
    #[error("failed to read stored progress: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to parse stored progress: {0}")]
    Codec(#[from] ProgressCodecError),
}

/// Errors emitted by `ProgressStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressStoreError {
    #[error("curriculum id must be positive, got {0}")]
    InvalidCurriculum(CurriculumId),
    #[error("lesson id must be positive, got {0}")]
    InvalidLesson(LessonId),
    #[error("failed to encode progress: {0}")]
    Encode(#[from] ProgressCodecError),
    #[error("failed to persist progress: {0}")]
    Persistence(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
