use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{context::Context, error::Result};

/// One user's progress through a wizard: where they are and what the flow
/// has accumulated so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub current_step_id: String,
    #[serde(skip)]
    pub context: Context,
}

impl Session {
    pub fn new(id: impl Into<String>, first_step_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            current_step_id: first_step_id.into(),
            context: Context::new(),
        }
    }
}

/// Persistence seam for sessions. The engine never touches storage
/// directly; an implementation is injected wherever sessions are handled.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: Session) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Session>>;
    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory [`SessionStorage`], the per-process analogue of keeping flow
/// state in browser-local storage.
#[derive(Default)]
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, Session>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: Session) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }
}
