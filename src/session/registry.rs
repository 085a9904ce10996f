use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use log::info;
use tokio::sync::Mutex;

use super::CoherenceSession;
use crate::config::EngineConfig;

/// Shared handle to one session. Holding the lock makes the holder the
/// session's only writer.
pub type SessionHandle = Arc<Mutex<CoherenceSession>>;

/// Concurrent map of live sessions. Cloning shares the same map.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<String, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with a fresh id.
    pub async fn create(&self, config: EngineConfig) -> Result<(String, SessionHandle)> {
        let session = CoherenceSession::new(config)?;
        let id = session.id().to_string();
        let handle = self.insert(session).await?;
        Ok((id, handle))
    }

    /// Register an existing session under its own id.
    pub async fn insert(&self, session: CoherenceSession) -> Result<SessionHandle> {
        let id = session.id().to_string();
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&id) {
            bail!("session {id} already exists");
        }

        let handle = Arc::new(Mutex::new(session));
        sessions.insert(id.clone(), Arc::clone(&handle));
        info!("session {id} registered ({} active)", sessions.len());
        Ok(handle)
    }

    pub async fn get(&self, id: &str) -> Result<SessionHandle> {
        self.sessions
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown session {id}"))
    }

    pub async fn remove(&self, id: &str) -> Option<SessionHandle> {
        let removed = self.sessions.lock().await.remove(id);
        if removed.is_some() {
            info!("session {id} removed");
        }
        removed
    }

    pub async fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CoherenceResult;
    use chrono::Utc;

    #[tokio::test]
    async fn create_get_remove() {
        let registry = SessionRegistry::new();
        let (id, _) = registry.create(EngineConfig::default()).await.unwrap();

        assert_eq!(registry.ids().await, vec![id.clone()]);
        assert!(registry.get(&id).await.is_ok());
        assert!(registry.remove(&id).await.is_some());
        assert!(registry.get(&id).await.is_err());
        assert!(registry.remove(&id).await.is_none());
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let registry = SessionRegistry::new();
        let a = CoherenceSession::with_id("writer", EngineConfig::default()).unwrap();
        let b = CoherenceSession::with_id("writer", EngineConfig::default()).unwrap();

        registry.insert(a).await.unwrap();
        assert!(registry.insert(b).await.is_err());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn concurrent_writers_serialise_per_session() {
        let registry = SessionRegistry::new();
        let (id, _) = registry.create(EngineConfig::default()).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            let id = id.clone();
            tasks.push(tokio::spawn(async move {
                let handle = registry.get(&id).await.unwrap();
                for _ in 0..25 {
                    let result =
                        CoherenceResult::new(0.5, 0.0, 0.0).with_components(0.5, 0.5, 0.5, 0.5);
                    handle.lock().await.analyze(Utc::now(), result, None, None);
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let handle = registry.get(&id).await.unwrap();
        let session = handle.lock().await;
        assert_eq!(session.sample_count(), 200);
        let indices: Vec<u64> = session.history().map(|r| r.sample_index).collect();
        assert_eq!(indices, (0..200).collect::<Vec<_>>());
    }
}
