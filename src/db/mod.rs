pub mod ratings;
pub mod redis;

pub use ratings::{JsonFileBackend, MemoryBackend, RatingBackend};
pub use self::redis::{create_redis_client, RedisRatingBackend};
