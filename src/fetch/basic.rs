use async_trait::async_trait;

use super::client::HttpClient;
use crate::error::Error;

pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, Error> {
        let wrap = |source: reqwest::Error| Error::NetworkFetch {
            url: url.to_string(),
            source: source.into(),
        };
        let response = self
            .0
            .get(url)
            .send()
            .await
            .map_err(wrap)?
            .error_for_status()
            .map_err(wrap)?;
        let bytes = response.bytes().await.map_err(wrap)?;
        Ok(bytes.to_vec())
    }
}
