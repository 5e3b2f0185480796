use log::{debug, info, warn};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::osu::data::{Beatmapset, RankStatus, SearchQuery};
use crate::osu::download::{download, mapset_file_name};
use crate::osu::fetch::{ControlSignal, Pacer, PagedFetcher};
use crate::osu::Session;
use crate::sink::ListWriter;
use crate::utils::log_error;

#[derive(Debug, Default, PartialEq)]
pub struct SyncReport {
    pub listed: usize,
    pub downloaded: usize,
    pub failed_downloads: usize,
    /// Statuses whose paging broke off, with the count reached before it did.
    pub aborted: Vec<(RankStatus, usize)>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.aborted.is_empty()
    }
}

/// Lists every configured status into one file and optionally downloads the mapsets.
///
/// A status whose paging fails is recorded in the report; the remaining
/// statuses still run.
pub async fn sync_beatmapsets<P: Pacer + Clone>(
    config: &Config,
    session: &Session,
    http: &Client,
    pacer: P,
) -> Result<SyncReport> {
    let mut writer = ListWriter::create(&config.output.list_path)?;
    let mut report = SyncReport::default();

    for &status in &config.search.statuses {
        let query = SearchQuery::new(config.search.mode, config.search.keys, status);
        let fetcher = PagedFetcher::new(session, http)
            .with_delay(Duration::from_secs(config.search.page_delay_secs))
            .with_max_pages(config.search.max_pages)
            .with_pacer(pacer.clone());

        let mut pending: Vec<Beatmapset> = Vec::new();
        let result = fetcher
            .fetch_all(&query.url(&session.base_url), |page| {
                writer.write_page(page)?;
                if config.output.download {
                    pending.extend(page.beatmapsets.iter().cloned());
                }
                Ok(ControlSignal::Continue)
            })
            .await;

        match result {
            Ok(count) => info!(
                "[{}] Listed {} beatmapsets ({} in the list so far)",
                status,
                count,
                writer.written()
            ),
            Err(e) => {
                warn!("[{}] Listing stopped after {} beatmapsets", status, e.fetched());
                log_error(&e);
                report.aborted.push((status, e.fetched()));
            }
        }

        if config.output.download && !pending.is_empty() {
            let dir = Path::new(&config.output.download_dir).join(status.as_str());
            let (done, failed) =
                download_all(http, &config.osu.download_base, &pending, &dir).await;
            report.downloaded += done;
            report.failed_downloads += failed;
        }
    }

    report.listed = writer.finish()?;
    info!(
        "Wrote {} entries to {}",
        report.listed, config.output.list_path
    );
    Ok(report)
}

/// Downloads one after another; a failed mapset is logged and skipped.
async fn download_all(
    http: &Client,
    download_base: &str,
    mapsets: &[Beatmapset],
    dir: &Path,
) -> (usize, usize) {
    let mut done = 0;
    let mut failed = 0;

    for mapset in mapsets {
        let destination = dir.join(mapset_file_name(mapset));
        debug!(
            "Fetching {} (mapped by {})",
            mapset.title,
            mapset.creator.as_deref().unwrap_or("unknown")
        );
        match download(http, download_base, &mapset.id, &destination).await {
            Ok(bytes) => {
                info!("Downloaded {} ({} bytes)", destination.display(), bytes);
                done += 1;
            }
            Err(e) => {
                warn!("Download of mapset {} failed: {}", mapset.id, e);
                failed += 1;
            }
        }
    }

    (done, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osu::fetch::TokioPacer;
    use serde_json::json;
    use std::fs;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SEARCH: &str = "/api/v2/beatmapsets/search";

    fn test_config(server: &MockServer, dir: &Path, statuses: Vec<RankStatus>) -> Config {
        let mut config = Config::default();
        config.osu.api_base = server.uri();
        config.osu.download_base = format!("{}/d/", server.uri());
        config.search.statuses = statuses;
        config.search.page_delay_secs = 0;
        config.output.list_path = dir.join("list.txt").display().to_string();
        config.output.download_dir = dir.join("songs").display().to_string();
        config
    }

    #[tokio::test]
    async fn test_failed_status_does_not_stop_the_others() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SEARCH))
            .and(query_param("s", "ranked"))
            .and(query_param("cursor_string", "next"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "beatmapsets": [{"id": 3, "title": "C", "artist": "Z"}],
                "cursor_string": null
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(SEARCH))
            .and(query_param("s", "ranked"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "beatmapsets": [
                    {"id": 1, "title": "A", "artist": "X"},
                    {"id": 2, "title": "B", "artist": "Y"}
                ],
                "cursor_string": "next"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(SEARCH))
            .and(query_param("s", "loved"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(
            &server,
            dir.path(),
            vec![RankStatus::Loved, RankStatus::Ranked],
        );
        let session = Session::new(server.uri(), "tok");

        let report = sync_beatmapsets(&config, &session, &Client::new(), TokioPacer)
            .await
            .unwrap();

        assert_eq!(report.listed, 3);
        assert_eq!(report.aborted, vec![(RankStatus::Loved, 0)]);
        assert!(!report.is_clean());
        assert_eq!(
            fs::read_to_string(&config.output.list_path).unwrap(),
            "1: 1-A (by X)\n2: 2-B (by Y)\n3: 3-C (by Z)\n"
        );
    }

    #[tokio::test]
    async fn test_downloads_land_under_status_directory() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SEARCH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "beatmapsets": [
                    {"id": 11, "title": "Good/Song", "artist": "X"},
                    {"id": 12, "title": "Gone", "artist": "Y"}
                ],
                "cursor_string": null
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/d/11"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"osz-bytes".to_vec()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/d/12"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(&server, dir.path(), vec![RankStatus::Qualified]);
        config.output.download = true;
        let session = Session::new(server.uri(), "tok");

        let report = sync_beatmapsets(&config, &session, &Client::new(), TokioPacer)
            .await
            .unwrap();

        assert!(report.is_clean());
        assert_eq!(report.listed, 2);
        assert_eq!(report.downloaded, 1);
        assert_eq!(report.failed_downloads, 1);

        let saved = dir
            .path()
            .join("songs")
            .join("qualified")
            .join("11-Good_Song.osz");
        assert_eq!(fs::read(saved).unwrap(), b"osz-bytes");
    }

    #[tokio::test]
    async fn test_nothing_is_downloaded_unless_enabled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SEARCH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "beatmapsets": [{"id": 11, "title": "A", "artist": "X"}],
                "cursor_string": null
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/d/11"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&server, dir.path(), vec![RankStatus::Loved]);
        let session = Session::new(server.uri(), "tok");

        let report = sync_beatmapsets(&config, &session, &Client::new(), TokioPacer)
            .await
            .unwrap();

        assert_eq!(report.listed, 1);
        assert_eq!(report.downloaded, 0);
        assert!(!dir.path().join("songs").exists());
    }
}
