use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversationError {
    #[error("unknown session: {0}")]
    UnknownSession(String),
    #[error("message is empty")]
    EmptyMessage,
    #[error("reply generation failed: {0}")]
    ReplyFailed(String),
}
