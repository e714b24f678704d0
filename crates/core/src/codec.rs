//! JSON document format for a persisted [`ProgressState`].
//!
//! ```json
//! { "1": { "1": { "completedAt": "2023-11-14T22:13:20.000Z" } } }
//! ```
//!
//! Outer keys are stringified curriculum ids, inner keys stringified lesson ids.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{CompletionRecord, CurriculumId, CurriculumProgress, LessonId, ProgressState};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressCodecError {
    #[error("malformed progress document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid {kind} key: {raw:?}")]
    InvalidKey { kind: &'static str, raw: String },

    #[error("invalid completedAt for curriculum {curriculum_id} lesson {lesson_id}: {raw:?}")]
    InvalidTimestamp {
        curriculum_id: CurriculumId,
        lesson_id: LessonId,
        raw: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct CompletionRecordDoc {
    #[serde(rename = "completedAt")]
    completed_at: String,
}

type ProgressDoc = BTreeMap<String, BTreeMap<String, CompletionRecordDoc>>;

/// Format a timestamp the way the document stores it (UTC, millisecond precision).
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serialize the state into its JSON document.
///
/// # Errors
///
/// Returns `ProgressCodecError::Json` if serialization fails.
pub fn encode(state: &ProgressState) -> Result<String, ProgressCodecError> {
    let mut doc = ProgressDoc::new();
    for (curriculum_id, lesson_id, record) in state.records() {
        doc.entry(curriculum_id.to_string()).or_default().insert(
            lesson_id.to_string(),
            CompletionRecordDoc {
                completed_at: format_timestamp(record.completed_at()),
            },
        );
    }
    Ok(serde_json::to_string(&doc)?)
}

/// Parse a JSON document back into a state.
///
/// Curricula with no lessons are dropped.
///
/// # Errors
///
/// Returns `ProgressCodecError` if the JSON is malformed, a key is not a
/// positive integer, or a timestamp is not RFC 3339.
pub fn decode(raw: &str) -> Result<ProgressState, ProgressCodecError> {
    let doc: ProgressDoc = serde_json::from_str(raw)?;
    let mut state = ProgressState::new();

    for (curriculum_key, lessons) in doc {
        let curriculum_id = parse_key::<CurriculumId>("curriculum", &curriculum_key)?;
        let mut progress = CurriculumProgress::new();

        for (lesson_key, entry) in lessons {
            let lesson_id = parse_key::<LessonId>("lesson", &lesson_key)?;
            let completed_at = DateTime::parse_from_rfc3339(&entry.completed_at)
                .map_err(|_| ProgressCodecError::InvalidTimestamp {
                    curriculum_id,
                    lesson_id,
                    raw: entry.completed_at.clone(),
                })?
                .with_timezone(&Utc);
            progress.mark(lesson_id, CompletionRecord::new(completed_at));
        }

        state.insert_curriculum(curriculum_id, progress);
    }

    Ok(state)
}

trait PositiveId: std::str::FromStr {
    fn raw(&self) -> u64;
}

impl PositiveId for CurriculumId {
    fn raw(&self) -> u64 {
        self.value()
    }
}

impl PositiveId for LessonId {
    fn raw(&self) -> u64 {
        self.value()
    }
}

fn parse_key<T: PositiveId>(kind: &'static str, raw: &str) -> Result<T, ProgressCodecError> {
    let invalid = || ProgressCodecError::InvalidKey {
        kind,
        raw: raw.to_owned(),
    };
    let id = raw.parse::<T>().map_err(|_| invalid())?;
    // keys must be canonical decimal: "01", "+1" and " 1" are rejected
    if id.raw() == 0 || id.raw().to_string() != raw {
        return Err(invalid());
    }
    Ok(id)
}
