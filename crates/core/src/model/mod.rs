mod ids;
mod progress;

pub use ids::{CurriculumId, LessonId, ParseIdError};
pub use progress::{CompletionRecord, CurriculumProgress, ProgressState};
