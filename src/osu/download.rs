use log::{debug, warn};
use reqwest::Client;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::osu::data::{Beatmapset, MapsetId};
use crate::utils::sanitize_file_name;

pub fn download_url(download_base: &str, id: &MapsetId) -> String {
    format!("{}/{}?n=1", download_base.trim_end_matches('/'), id)
}

/// `{id}-{title}.osz`, safe to use as a file name.
pub fn mapset_file_name(mapset: &Beatmapset) -> String {
    format!(
        "{}-{}.osz",
        sanitize_file_name(&mapset.id.to_string()),
        sanitize_file_name(&mapset.title)
    )
}

/// Streams one mapset archive to `destination`, replacing whatever is there.
///
/// Returns the number of bytes written. A transfer that fails halfway
/// removes the partial file.
pub async fn download(
    http: &Client,
    download_base: &str,
    id: &MapsetId,
    destination: &Path,
) -> Result<u64> {
    let url = download_url(download_base, id);
    let mut response = http.get(&url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status {
            status: status.as_u16(),
            url,
        });
    }

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = File::create(destination).await?;
    let mut written: u64 = 0;
    let streamed = async {
        while let Some(chunk) = response.chunk().await? {
            if chunk.is_empty() {
                continue;
            }
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok::<(), Error>(())
    }
    .await;
    drop(file);

    if let Err(e) = streamed {
        warn!("Download of {} broke off after {} bytes", url, written);
        if let Err(remove_err) = fs::remove_file(destination).await {
            debug!("Could not remove partial {}: {}", destination.display(), remove_err);
        }
        return Err(e);
    }

    debug!("Wrote {} bytes to {}", written, destination.display());
    Ok(written)
}
