pub mod conversation;
pub mod emotion;
pub mod identifiers;
pub mod job;
pub mod media;

pub use conversation::{ChatMessage, ConversationSession, Role};
pub use emotion::{EmotionResult, LabelScore};
pub use identifiers::{JobId, JobIdError, SessionId};
pub use job::{AnalysisJob, JobError, JobState};
pub use media::MediaRef;
