pub mod analysis;
pub mod conversation;
pub mod ingest;

pub use analysis::{AnalysisError, ParseError, PollError, ProviderError, SubmissionError};
pub use conversation::ConversationError;
pub use ingest::IngestError;
