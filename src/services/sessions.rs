//! Session storage and the per-session visit counter

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};

/// Session key holding the number of home page visits
pub const NUM_VISITS: &str = "num_visits";

/// Integer values stored per session id
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn exists(&self, session_id: &str) -> AppResult<bool>;

    async fn get_int(&self, session_id: &str, key: &str) -> AppResult<Option<i64>>;

    async fn set_int(&self, session_id: &str, key: &str, value: i64) -> AppResult<()>;
}

/// Sessions kept in Redis hashes (`session:{id}`) with a sliding expiry
#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    /// Connect and verify the server answers
    pub async fn new(url: &str, ttl_seconds: u64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client, ttl_seconds })
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))
    }

    fn key(session_id: &str) -> String {
        format!("session:{}", session_id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn exists(&self, session_id: &str) -> AppResult<bool> {
        let mut conn = self.connection().await?;
        let exists: bool = conn
            .exists(Self::key(session_id))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read session from Redis: {}", e)))?;
        Ok(exists)
    }

    async fn get_int(&self, session_id: &str, key: &str) -> AppResult<Option<i64>> {
        let mut conn = self.connection().await?;
        let value: Option<i64> = conn
            .hget(Self::key(session_id), key)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read session from Redis: {}", e)))?;
        Ok(value)
    }

    async fn set_int(&self, session_id: &str, key: &str, value: i64) -> AppResult<()> {
        let mut conn = self.connection().await?;
        let redis_key = Self::key(session_id);
        redis::pipe()
            .atomic()
            .hset(&redis_key, key, value)
            .ignore()
            .expire(&redis_key, self.ttl_seconds as i64)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write session to Redis: {}", e)))?;
        Ok(())
    }
}

/// Process-local sessions for tests and local development only. Entries
/// never expire, so every new visitor grows the map until restart.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, HashMap<String, i64>>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn exists(&self, session_id: &str) -> AppResult<bool> {
        Ok(self.sessions.read().await.contains_key(session_id))
    }

    async fn get_int(&self, session_id: &str, key: &str) -> AppResult<Option<i64>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).and_then(|data| data.get(key)).copied())
    }

    async fn set_int(&self, session_id: &str, key: &str, value: i64) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }
}

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Whether the store holds data for this session id
    pub async fn is_known(&self, session_id: &str) -> AppResult<bool> {
        self.store.exists(session_id).await
    }

    /// Return the visits seen so far in this session and count the current one.
    /// Read and write are separate: concurrent requests may lose an increment.
    pub async fn record_visit(&self, session_id: &str) -> AppResult<i64> {
        let visits = self.store.get_int(session_id, NUM_VISITS).await?.unwrap_or(0);
        self.store.set_int(session_id, NUM_VISITS, visits + 1).await?;
        tracing::debug!(session = %session_id, visits, "Recorded visit");
        Ok(visits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn nth_visit_reports_n_minus_one() {
        let service = SessionService::new(Arc::new(MemorySessionStore::new()));
        for expected in 0..5 {
            assert_eq!(service.record_visit("abc").await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn sessions_are_counted_separately() {
        let service = SessionService::new(Arc::new(MemorySessionStore::new()));
        service.record_visit("first").await.unwrap();
        service.record_visit("first").await.unwrap();
        assert_eq!(service.record_visit("second").await.unwrap(), 0);
        assert_eq!(service.record_visit("first").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn sessions_are_known_once_written() {
        let service = SessionService::new(Arc::new(MemorySessionStore::new()));
        assert!(!service.is_known("forged").await.unwrap());
        service.record_visit("forged").await.unwrap();
        assert!(service.is_known("forged").await.unwrap());
    }

    #[tokio::test]
    async fn stored_value_is_incremented() {
        let mut store = MockSessionStore::new();
        store
            .expect_get_int()
            .with(eq("s1"), eq(NUM_VISITS))
            .returning(|_, _| Ok(Some(41)));
        store
            .expect_set_int()
            .with(eq("s1"), eq(NUM_VISITS), eq(42))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = SessionService::new(Arc::new(store));
        assert_eq!(service.record_visit("s1").await.unwrap(), 41);
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let mut store = MockSessionStore::new();
        store
            .expect_get_int()
            .returning(|_, _| Err(AppError::Internal("redis down".to_string())));
        store.expect_set_int().never();

        let service = SessionService::new(Arc::new(store));
        assert!(matches!(
            service.record_visit("s1").await,
            Err(AppError::Internal(_))
        ));
    }
}
