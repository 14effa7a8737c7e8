use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FsError>;

#[derive(Error, Debug)]
pub enum FsError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("remote request failed with HTTP status {status}: {body}")]
    RemoteRequest { status: StatusCode, body: String },

    #[error("got more bytes ({received}) than requested ({requested})")]
    SizeMismatch { received: u64, requested: u64 },

    #[error("the operation is unsupported: {0}")]
    Unsupported(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0} not provided")]
    MissingUrl(&'static str),

    #[error("{0} is a directory")]
    IsADirectory(String),

    #[error("invalid open mode `{0}`")]
    InvalidMode(String),

    #[error("I/O operation on closed file")]
    Closed,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid byte range [{start}, {end})")]
    InvalidRange { start: u64, end: u64 },

    #[error("stream did not contain valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FsError {
    /// Maps a failed response onto `NotFound` / `RemoteRequest`, consuming the body
    /// for diagnostics.
    pub(crate) async fn from_response(what: impl Into<String>, res: reqwest::Response) -> Self {
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return FsError::NotFound(what.into());
        }
        let body = res.text().await.unwrap_or_default();
        FsError::RemoteRequest { status, body }
    }
}
