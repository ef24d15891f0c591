use std::collections::HashMap;

use redis::{aio::ConnectionManager, AsyncCommands, Client};

use crate::{db::RatingBackend, error::AppResult};

/// Creates a Redis client for rating persistence
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Ratings stored as fields of a single Redis hash
///
/// Field = movie id, value = rating as a decimal string. Writes go straight to
/// Redis and are acknowledged before returning.
#[derive(Clone)]
pub struct RedisRatingBackend {
    conn: ConnectionManager,
    key: String,
}

impl RedisRatingBackend {
    pub async fn connect(client: Client, key: impl Into<String>) -> AppResult<Self> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            key: key.into(),
        })
    }
}

#[async_trait::async_trait]
impl RatingBackend for RedisRatingBackend {
    async fn get(&self, field: &str) -> AppResult<Option<f64>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.hget(&self.key, field).await?;
        Ok(raw.and_then(|value| parse_value(field, &value)))
    }

    async fn set(&self, field: &str, value: f64) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.hset(&self.key, field, value.to_string()).await?;
        Ok(())
    }

    async fn delete(&self, field: &str) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.hdel(&self.key, field).await?;
        Ok(removed > 0)
    }

    async fn all(&self) -> AppResult<HashMap<String, f64>> {
        let mut conn = self.conn.clone();
        let raw: HashMap<String, String> = conn.hgetall(&self.key).await?;
        Ok(raw
            .into_iter()
            .filter_map(|(field, value)| parse_value(&field, &value).map(|v| (field, v)))
            .collect())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

fn parse_value(field: &str, value: &str) -> Option<f64> {
    match value.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(field = %field, value = %value, "Skipping non-numeric rating in Redis");
            None
        }
    }
}
