mod config;
mod error;
mod osu;
mod sink;
mod sync;
mod utils;

use env_logger::Env;
use log::{error, info};
use std::process::ExitCode;

use crate::error::Result;
use crate::osu::fetch::TokioPacer;
use crate::sync::SyncReport;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    ExitCode::from(exit_status(&run().await))
}

/// 0 only when every status was listed completely.
fn exit_status(outcome: &Result<SyncReport>) -> u8 {
    match outcome {
        Ok(report) if report.is_clean() => 0,
        Ok(report) => {
            for (status, fetched) in &report.aborted {
                error!("[{}] incomplete: only {} beatmapsets were listed", status, fetched);
            }
            1
        }
        Err(e) => {
            utils::log_error(e);
            1
        }
    }
}

async fn run() -> Result<SyncReport> {
    // Load configuration
    let config = config::load_config()?;

    // Authenticate once through the shared client; the session is passed down explicitly
    let http = osu::http_client(&config.http)?;
    let session = osu::auth::obtain_token(&config.osu, &http).await?;

    let report = sync::sync_beatmapsets(&config, &session, &http, TokioPacer).await?;
    info!(
        "Done: {} listed, {} downloaded, {} downloads failed",
        report.listed, report.downloaded, report.failed_downloads
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::osu::data::RankStatus;

    #[test]
    fn clean_run_exits_zero() {
        let report = SyncReport {
            listed: 12,
            downloaded: 3,
            failed_downloads: 1,
            aborted: vec![],
        };
        assert_eq!(exit_status(&Ok(report)), 0);
    }

    #[test]
    fn aborted_status_exits_one() {
        let report = SyncReport {
            listed: 5,
            aborted: vec![(RankStatus::Loved, 5)],
            ..SyncReport::default()
        };
        assert_eq!(exit_status(&Ok(report)), 1);
    }

    #[test]
    fn setup_failure_exits_one() {
        let outcome: Result<SyncReport> = Err(Error::Auth("rejected".into()));
        assert_eq!(exit_status(&outcome), 1);
    }
}
