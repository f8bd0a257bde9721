//! Minimal chat session keyed by id, opened after an analysis.

pub mod reply;
pub mod store;

use std::sync::Arc;

use log::{debug, info, warn};

use crate::shared::entities::{ChatMessage, ConversationSession, Role, SessionId};
use crate::shared::error::ConversationError;
use crate::shared::ports::{ReplyPort, SessionStorePort};

pub use reply::{CannedReplies, FOLLOW_UP_REPLY};
pub use store::InMemorySessionStore;

pub const SYSTEM_PROMPT: &str = "You are a compassionate assistant.";

pub struct ConversationService {
    store: Arc<dyn SessionStorePort>,
    replies: Arc<dyn ReplyPort>,
}

impl ConversationService {
    pub fn new(store: Arc<dyn SessionStorePort>, replies: Arc<dyn ReplyPort>) -> Self {
        Self { store, replies }
    }

    /// Opens a session seeded with the detected emotion and returns the
    /// assistant's first reply.
    pub async fn start_session(
        &self,
        emotion: &str,
    ) -> Result<(SessionId, String), ConversationError> {
        let reply = self.replies.opening_reply(emotion.to_string()).await?;
        let id = SessionId::new();
        let session = ConversationSession::new(
            id.clone(),
            vec![
                ChatMessage::new(Role::System, SYSTEM_PROMPT),
                ChatMessage::new(Role::User, format!("I am feeling {}.", emotion)),
                ChatMessage::new(Role::Assistant, reply.clone()),
            ],
        );
        if let Some(evicted) = self.store.create(session) {
            debug!("[conversation] evicted session {}", evicted);
        }
        info!(
            "[conversation] session {} started ({}), {} open",
            id,
            emotion,
            self.store.session_count()
        );
        Ok((id, reply))
    }

    pub fn append_turn(
        &self,
        id: &SessionId,
        role: Role,
        content: impl Into<String>,
    ) -> Result<(), ConversationError> {
        self.store.append(id, ChatMessage::new(role, content))
    }

    pub async fn chat(&self, chat_id: &str, message: &str) -> Result<String, ConversationError> {
        let unknown = || ConversationError::UnknownSession(chat_id.to_string());
        let id = SessionId::parse(chat_id).ok_or_else(unknown)?;
        let session = self.store.get(&id).ok_or_else(unknown)?;

        let message = message.trim();
        if message.is_empty() {
            return Err(ConversationError::EmptyMessage);
        }

        let user_turn = ChatMessage::new(Role::User, message);
        let mut history = session.messages().to_vec();
        history.push(user_turn.clone());

        // Nothing is recorded unless the reply arrives.
        let reply = self.replies.follow_up(history).await.map_err(|e| {
            warn!("[conversation] reply failed for {}: {}", id, e);
            e
        })?;
        self.store.extend(
            &id,
            vec![user_turn, ChatMessage::new(Role::Assistant, reply.clone())],
        )?;
        Ok(reply)
    }

    pub fn session(&self, id: &SessionId) -> Option<ConversationSession> {
        self.store.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ports::ReplyFuture;

    fn service() -> ConversationService {
        ConversationService::new(
            Arc::new(InMemorySessionStore::unbounded()),
            Arc::new(CannedReplies::new()),
        )
    }

    struct FailingReplies;

    impl ReplyPort for FailingReplies {
        fn opening_reply(&self, _emotion: String) -> ReplyFuture<Result<String, ConversationError>> {
            Box::pin(async { Ok("hello".to_string()) })
        }

        fn follow_up(&self, _history: Vec<ChatMessage>) -> ReplyFuture<Result<String, ConversationError>> {
            Box::pin(async { Err(ConversationError::ReplyFailed("model down".to_string())) })
        }
    }

    #[tokio::test]
    async fn start_session_seeds_history() {
        let svc = service();
        let (id, reply) = svc.start_session("joy").await.unwrap();
        assert_eq!(reply, "I'm here for you. It sounds like you're feeling joy.");

        let session = svc.session(&id).unwrap();
        let roles: Vec<Role> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(session.messages()[0].content, SYSTEM_PROMPT);
        assert_eq!(session.messages()[1].content, "I am feeling joy.");
    }

    #[tokio::test]
    async fn chat_appends_both_turns() {
        let svc = service();
        let (id, _) = svc.start_session("sadness").await.unwrap();
        let reply = svc.chat(id.as_str(), "  rough day  ").await.unwrap();
        assert_eq!(reply, FOLLOW_UP_REPLY);

        let session = svc.session(&id).unwrap();
        assert_eq!(session.messages().len(), 5);
        assert_eq!(session.messages()[3].role, Role::User);
        assert_eq!(session.messages()[3].content, "rough day");
        assert_eq!(session.messages()[4].role, Role::Assistant);
    }

    #[tokio::test]
    async fn unknown_session_is_checked_before_message() {
        let svc = service();
        let err = svc.chat("not-a-session", "").await.unwrap_err();
        assert_eq!(err, ConversationError::UnknownSession("not-a-session".to_string()));

        let missing = SessionId::new();
        let err = svc.chat(missing.as_str(), "hi").await.unwrap_err();
        assert!(matches!(err, ConversationError::UnknownSession(_)));
    }

    #[tokio::test]
    async fn blank_message_is_rejected_without_mutation() {
        let svc = service();
        let (id, _) = svc.start_session("joy").await.unwrap();
        let err = svc.chat(id.as_str(), " \n\t").await.unwrap_err();
        assert_eq!(err, ConversationError::EmptyMessage);
        assert_eq!(svc.session(&id).unwrap().messages().len(), 3);
    }

    #[tokio::test]
    async fn append_turn_on_unknown_id_fails() {
        let svc = service();
        let (known, _) = svc.start_session("calm").await.unwrap();
        let err = svc
            .append_turn(&SessionId::new(), Role::User, "hello")
            .unwrap_err();
        assert!(matches!(err, ConversationError::UnknownSession(_)));
        assert_eq!(svc.session(&known).unwrap().messages().len(), 3);
    }

    #[tokio::test]
    async fn reply_failure_surfaces() {
        let svc = ConversationService::new(
            Arc::new(InMemorySessionStore::unbounded()),
            Arc::new(FailingReplies),
        );
        let (id, _) = svc.start_session("anger").await.unwrap();
        let err = svc.chat(id.as_str(), "hi").await.unwrap_err();
        assert!(matches!(err, ConversationError::ReplyFailed(_)));
    }

    #[tokio::test]
    async fn failed_reply_leaves_history_untouched() {
        let svc = ConversationService::new(
            Arc::new(InMemorySessionStore::unbounded()),
            Arc::new(FailingReplies),
        );
        let (id, _) = svc.start_session("anger").await.unwrap();
        let before = svc.session(&id).unwrap();
        for _ in 0..3 {
            assert!(svc.chat(id.as_str(), "hi").await.is_err());
        }
        let after = svc.session(&id).unwrap();
        assert_eq!(after.messages().len(), 3);
        assert_eq!(after, before);
        assert_eq!(after.messages().last().unwrap().role, Role::Assistant);
    }
}
