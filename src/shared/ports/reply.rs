use std::future::Future;
use std::pin::Pin;

use crate::shared::entities::ChatMessage;
use crate::shared::error::ConversationError;

pub type ReplyFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Produces assistant turns. Swap in a model-backed implementation to get a
/// real conversation.
pub trait ReplyPort: Send + Sync {
    fn opening_reply(&self, emotion: String) -> ReplyFuture<Result<String, ConversationError>>;
    fn follow_up(&self, history: Vec<ChatMessage>) -> ReplyFuture<Result<String, ConversationError>>;
}
