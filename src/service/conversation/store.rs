use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::shared::entities::{ChatMessage, ConversationSession, SessionId};
use crate::shared::error::ConversationError;
use crate::shared::ports::SessionStorePort;

/// Process-memory session store. Sessions are lost on restart.
pub struct InMemorySessionStore {
    inner: Mutex<Inner>,
    capacity: Option<usize>,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<SessionId, ConversationSession>,
    /// Creation order, oldest first.
    order: VecDeque<SessionId>,
}

impl InMemorySessionStore {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.filter(|c| *c > 0),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStorePort for InMemorySessionStore {
    fn create(&self, session: ConversationSession) -> Option<SessionId> {
        let mut inner = self.lock();
        let id = session.id().clone();
        if inner.sessions.insert(id.clone(), session).is_some() {
            return None;
        }
        inner.order.push_back(id);

        let capacity = self.capacity?;
        if inner.sessions.len() <= capacity {
            return None;
        }
        let evicted = inner.order.pop_front()?;
        inner.sessions.remove(&evicted);
        Some(evicted)
    }

    fn get(&self, id: &SessionId) -> Option<ConversationSession> {
        self.lock().sessions.get(id).cloned()
    }

    fn append(&self, id: &SessionId, message: ChatMessage) -> Result<(), ConversationError> {
        let mut inner = self.lock();
        let session = inner
            .sessions
            .get_mut(id)
            .ok_or_else(|| ConversationError::UnknownSession(id.to_string()))?;
        session.push(message);
        Ok(())
    }

    fn extend(&self, id: &SessionId, messages: Vec<ChatMessage>) -> Result<(), ConversationError> {
        let mut inner = self.lock();
        let session = inner
            .sessions
            .get_mut(id)
            .ok_or_else(|| ConversationError::UnknownSession(id.to_string()))?;
        for message in messages {
            session.push(message);
        }
        Ok(())
    }

    fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }
}
