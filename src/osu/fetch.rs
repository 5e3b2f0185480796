use log::{debug, error, info, warn};
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::osu::data::Page;
use crate::osu::Session;

/// Pause between pages the search endpoint tolerates without rate limiting us.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(5);

const CURSOR_PARAM: &str = "cursor_string";

/// Returned by a page handler to keep paging or end the run early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Continue,
    Stop,
}

/// Waits between two page requests.
pub trait Pacer {
    fn pause(&self, delay: Duration) -> impl Future<Output = ()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    fn pause(&self, delay: Duration) -> impl Future<Output = ()> {
        tokio::time::sleep(delay)
    }
}

/// Follows the server cursor of a search query until it runs out.
pub struct PagedFetcher<'a, P = TokioPacer> {
    session: &'a Session,
    http: &'a Client,
    delay: Duration,
    max_pages: Option<usize>,
    pacer: P,
}

impl<'a> PagedFetcher<'a> {
    pub fn new(session: &'a Session, http: &'a Client) -> Self {
        Self {
            session,
            http,
            delay: DEFAULT_PAGE_DELAY,
            max_pages: None,
            pacer: TokioPacer,
        }
    }
}

impl<'a, P: Pacer> PagedFetcher<'a, P> {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// `None` pages until the server stops handing out cursors.
    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_pacer<Q: Pacer>(self, pacer: Q) -> PagedFetcher<'a, Q> {
        PagedFetcher {
            session: self.session,
            http: self.http,
            delay: self.delay,
            max_pages: self.max_pages,
            pacer,
        }
    }

    /// Requests every page of `base_query_url`, handing each one to `on_page`.
    ///
    /// Returns the number of items seen. Any failure ends the loop with
    /// [`Error::Aborted`] carrying the count of the pages handled before it.
    pub async fn fetch_all<F>(&self, base_query_url: &str, mut on_page: F) -> Result<usize>
    where
        F: FnMut(&Page) -> Result<ControlSignal>,
    {
        let mut total = 0;
        match self.page_through(base_query_url, &mut on_page, &mut total).await {
            Ok(pages) => {
                info!("Fetched {} items over {} pages", total, pages);
                Ok(total)
            }
            Err(e) => {
                error!("Paging {} aborted after {} items: {}", base_query_url, total, e);
                Err(e.aborted(total))
            }
        }
    }

    async fn page_through<F>(
        &self,
        base_query_url: &str,
        on_page: &mut F,
        total: &mut usize,
    ) -> Result<usize>
    where
        F: FnMut(&Page) -> Result<ControlSignal>,
    {
        let mut cursor: Option<String> = None;
        let mut pages = 0;

        loop {
            let url = page_url(base_query_url, cursor.as_deref())?;
            let page = self.fetch_page(&url).await?;
            pages += 1;

            let signal = on_page(&page)?;
            *total += page.len();
            debug!(
                "Page {}: {} items, more pending: {}",
                pages,
                page.len(),
                page.cursor_string.is_some()
            );

            if page.is_empty() && page.cursor_string.is_some() {
                warn!("Page {} came back empty but still carries a cursor", pages);
            }

            if signal == ControlSignal::Stop {
                info!("Page handler stopped paging after page {}", pages);
                return Ok(pages);
            }

            match page.cursor_string {
                Some(next) => cursor = Some(next),
                None => return Ok(pages),
            }

            if let Some(limit) = self.max_pages {
                if pages >= limit {
                    return Err(Error::PageLimit { limit });
                }
            }

            self.pacer.pause(self.delay).await;
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<Page> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.session.access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        Page::from_body(url, &body)
    }
}

/// The first page is the query as given; later pages append the cursor pair.
pub fn page_url(base_query_url: &str, cursor: Option<&str>) -> Result<String> {
    let Some(cursor) = cursor else {
        return Ok(base_query_url.to_string());
    };

    let mut url = Url::parse(base_query_url)
        .map_err(|e| Error::Config(format!("invalid query url {}: {}", base_query_url, e)))?;
    url.query_pairs_mut().append_pair(CURSOR_PARAM, cursor);
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://osu.example/api/v2/beatmapsets/search?m=3&q=key%3D4&s=loved&nsfw=";

    #[test]
    fn first_page_has_no_cursor() {
        assert_eq!(page_url(BASE, None).unwrap(), BASE);
    }

    #[test]
    fn cursor_is_appended_to_existing_query() {
        assert_eq!(
            page_url(BASE, Some("abc")).unwrap(),
            format!("{}&cursor_string=abc", BASE)
        );
    }

    #[test]
    fn cursor_without_existing_query() {
        assert_eq!(
            page_url("https://osu.example/search", Some("abc")).unwrap(),
            "https://osu.example/search?cursor_string=abc"
        );
    }

    #[test]
    fn reserved_cursor_bytes_are_encoded() {
        let url = page_url(BASE, Some("eyJ+a/b=")).unwrap();
        assert!(url.ends_with("&cursor_string=eyJ%2Ba%2Fb%3D"));

        let parsed = Url::parse(&url).unwrap();
        let cursor = parsed
            .query_pairs()
            .find(|(k, _)| k == CURSOR_PARAM)
            .map(|(_, v)| v.into_owned());
        assert_eq!(cursor.as_deref(), Some("eyJ+a/b="));
    }
}
