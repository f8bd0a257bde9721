use crate::shared::entities::{ChatMessage, ConversationSession, SessionId};
use crate::shared::error::ConversationError;

/// Keyed conversation log. Implementations must keep appends to one session
/// in call order; different sessions are independent.
pub trait SessionStorePort: Send + Sync {
    /// Inserts a new session. Returns the id of a session evicted to make room, if any.
    fn create(&self, session: ConversationSession) -> Option<SessionId>;
    fn get(&self, id: &SessionId) -> Option<ConversationSession>;
    fn append(&self, id: &SessionId, message: ChatMessage) -> Result<(), ConversationError>;
    /// Appends `messages` as one unit: either all land, adjacent and in
    /// order, or none do.
    fn extend(&self, id: &SessionId, messages: Vec<ChatMessage>) -> Result<(), ConversationError>;
    fn session_count(&self) -> usize;
}
