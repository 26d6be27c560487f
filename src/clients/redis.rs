use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::info;

use crate::clients::store::ExpiringSet;

/// Dedup store shared between relay instances through Redis.
pub struct RedisExpiringSet {
    connection: MultiplexedConnection,
}

impl RedisExpiringSet {
    pub async fn connect(redis_url: &str) -> Result<Self, Error> {
        info!("Connecting to Redis...");

        let client =
            Client::open(redis_url).map_err(|_| anyhow!("Failed to create redis client"))?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|_| anyhow!("Failed to connect to redis client"))?;

        info!("Redis connection established");

        Ok(Self { connection })
    }

    fn key(key: &str) -> String {
        format!("dedup:{}", key)
    }
}

#[async_trait]
impl ExpiringSet for RedisExpiringSet {
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, Error> {
        let mut connection = self.connection.clone();

        // SET NX replies OK when the key was created and nil when it already existed.
        let reply: Option<String> = redis::cmd("SET")
            .arg(Self::key(key))
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut connection)
            .await
            .map_err(|e| anyhow!("Failed to set dedup flag: {}", e))?;

        Ok(reply.is_some())
    }

    async fn ping(&self) -> Result<(), Error> {
        let mut connection = self.connection.clone();

        connection
            .ping::<String>()
            .await
            .map_err(|e| anyhow!("Ping failed: {}", e))?;

        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
