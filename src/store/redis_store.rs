use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;

use super::{JobStore, StatusUpdate, StoreError};
use crate::models::job::{JobAttributes, JobRecord};

/// Writes every field and sets the expiry, unless the key already exists.
const CREATE_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
  return 0
end
redis.call('HSET', KEYS[1], unpack(ARGV, 2))
if ARGV[1] ~= '' then
  redis.call('EXPIREAT', KEYS[1], tonumber(ARGV[1]))
end
return 1
"#;

/// ARGV[1] holds the space-separated statuses the update may be applied to,
/// the rest are field/value pairs. Returns 'OK', '' when the record is
/// missing, or the current status when the transition is refused.
const APPLY_SCRIPT: &str = r#"
local current = redis.call('HGET', KEYS[1], 'status')
if not current then
  return ''
end
for allowed in string.gmatch(ARGV[1], '%S+') do
  if allowed == current then
    redis.call('HSET', KEYS[1], unpack(ARGV, 2))
    return 'OK'
  end
end
return current
"#;

/// Redis-backed job store: one hash per job, expiring at the record's `ttl`.
pub struct RedisJobStore {
    client: redis::Client,
    key_prefix: String,
    create_script: redis::Script,
    apply_script: redis::Script,
}

impl RedisJobStore {
    pub fn new(redis_url: &str, key_prefix: impl Into<String>) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url).map_err(StoreError::Redis)?;
        Ok(Self {
            client,
            key_prefix: key_prefix.into(),
            create_script: redis::Script::new(CREATE_SCRIPT),
            apply_script: redis::Script::new(APPLY_SCRIPT),
        })
    }

    fn key(&self, job_id: &str) -> String {
        format!("{}{}", self.key_prefix, job_id)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(StoreError::Redis)
    }
}

#[async_trait]
impl JobStore for RedisJobStore {
    async fn create(&self, record: &JobRecord) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let expire_at = record.ttl.map(|t| t.to_string()).unwrap_or_default();

        let mut invocation = self.create_script.key(self.key(&record.job_id));
        invocation.arg(expire_at);
        for (name, value) in record.to_attributes() {
            invocation.arg(name).arg(value);
        }

        let created: i64 = invocation.invoke_async(&mut conn).await?;
        if created == 0 {
            return Err(StoreError::AlreadyExists(record.job_id.clone()));
        }
        Ok(())
    }

    async fn fetch(&self, job_id: &str) -> Result<Option<JobAttributes>, StoreError> {
        let mut conn = self.connection().await?;
        let attrs: HashMap<String, String> = conn.hgetall(self.key(job_id)).await?;
        Ok((!attrs.is_empty()).then_some(attrs))
    }

    async fn apply(&self, job_id: &str, update: &StatusUpdate) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;

        let mut invocation = self.apply_script.key(self.key(job_id));
        invocation.arg(update.permitted_spellings().join(" "));
        for (name, value) in update.attributes(Utc::now()) {
            invocation.arg(name).arg(value);
        }

        let outcome: String = invocation.invoke_async(&mut conn).await?;
        match outcome.as_str() {
            "OK" => Ok(()),
            "" => Err(StoreError::NotFound(job_id.to_string())),
            _ => Err(StoreError::InvalidTransition {
                job_id: job_id.to_string(),
                from: outcome,
                to: update.target_status(),
            }),
        }
    }

    /// Check Redis connectivity (for health checks).
    async fn health_check(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(StoreError::Redis)?;
        Ok(())
    }
}
