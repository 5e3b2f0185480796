use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse config file: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to write config template: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Server answered {status} for {url}")]
    Status { status: u16, url: String },
    #[error("Malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Gave up after {limit} pages with more results pending")]
    PageLimit { limit: usize },

    #[error("Fetch aborted after {fetched} items: {source}")]
    Aborted {
        fetched: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Items counted before the failure; zero for errors raised outside a fetch loop.
    pub fn fetched(&self) -> usize {
        match self {
            Error::Aborted { fetched, .. } => *fetched,
            _ => 0,
        }
    }

    pub(crate) fn aborted(self, fetched: usize) -> Self {
        Error::Aborted {
            fetched,
            source: Box::new(self),
        }
    }
}
