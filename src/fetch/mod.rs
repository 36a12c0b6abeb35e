mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use std::path::Path;

use crate::error::Error;

/// Downloads `url` into `path`, creating parent directories as needed.
pub async fn download_to_file<C: HttpClient>(
    client: &C,
    url: &str,
    path: &Path,
) -> Result<(), Error> {
    let bytes = client.get(url).await?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}
