use crate::shared::entities::ChatMessage;
use crate::shared::error::ConversationError;
use crate::shared::ports::{ReplyFuture, ReplyPort};

pub const FOLLOW_UP_REPLY: &str = "I hear you. Thanks for sharing.";

/// Fixed replies; no model is called.
#[derive(Debug, Default, Clone)]
pub struct CannedReplies;

impl CannedReplies {
    pub fn new() -> Self {
        Self
    }
}

impl ReplyPort for CannedReplies {
    fn opening_reply(&self, emotion: String) -> ReplyFuture<Result<String, ConversationError>> {
        Box::pin(async move {
            Ok(format!(
                "I'm here for you. It sounds like you're feeling {}.",
                emotion
            ))
        })
    }

    fn follow_up(&self, _history: Vec<ChatMessage>) -> ReplyFuture<Result<String, ConversationError>> {
        Box::pin(async { Ok(FOLLOW_UP_REPLY.to_string()) })
    }
}
