use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use perch_core::{SessionContext, TenantId, UserId};

use crate::backend::SessionStore;
use crate::{LockToken, StoreResult};

/// Release only if the caller's token still owns the lock.
const RELEASE_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
else
    return 0
end
"#;

/// Redis-backed session store.
///
/// This is the backend that makes the lock guarantee hold system-wide:
/// `SET NX PX` gives one owner per user id across every server instance,
/// and the Lua release script keeps a stale holder from deleting a lock it
/// no longer owns.
///
/// Key layout:
/// - `session:{userId}` -> JSON [`SessionContext`]
/// - `lock:switch:{userId}` -> [`LockToken`]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect with an auto-reconnecting connection manager.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        debug!("connected redis session store");
        Ok(Self { conn })
    }

    /// Wrap an existing connection manager (shared with other subsystems).
    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn session_key(user: &UserId) -> String {
        format!("session:{}", user)
    }

    fn lock_key(user: &UserId) -> String {
        format!("lock:switch:{}", user)
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn get_active_tenant(&self, user: &UserId) -> StoreResult<Option<SessionContext>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(Self::session_key(user)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set_active_tenant(
        &self,
        user: &UserId,
        tenant: &TenantId,
        ttl: Option<Duration>,
    ) -> StoreResult<SessionContext> {
        let mut conn = self.conn.clone();
        let ctx = SessionContext::new(tenant.clone());
        let json = serde_json::to_string(&ctx)?;
        let key = Self::session_key(user);
        match ttl {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, json, ttl.as_secs()).await?,
            None => conn.set::<_, _, ()>(key, json).await?,
        }
        Ok(ctx)
    }

    async fn clear_active_tenant(&self, user: &UserId) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(Self::session_key(user)).await?;
        Ok(())
    }

    async fn try_acquire_lock(
        &self,
        user: &UserId,
        ttl: Duration,
    ) -> StoreResult<Option<LockToken>> {
        let mut conn = self.conn.clone();
        let token = LockToken::new();

        // SET NX PX: one owner per user id, self-expiring.
        let reply: Option<String> = redis::cmd("SET")
            .arg(Self::lock_key(user))
            .arg(token.as_str())
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await?;

        Ok(reply.map(|_| token))
    }

    async fn release_lock(&self, user: &UserId, token: &LockToken) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let released: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(Self::lock_key(user))
            .arg(token.as_str())
            .invoke_async(&mut conn)
            .await?;
        Ok(released == 1)
    }
}
