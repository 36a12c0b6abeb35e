use async_trait::async_trait;

use crate::error::Error;

/// Byte-level HTTP GET, so callers and tests never touch transport types.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>, Error>;
}
