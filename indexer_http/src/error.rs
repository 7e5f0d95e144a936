use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Every attempt against every eligible pool failed; carries the last
    /// underlying error observed.
    RequestFailed(String),
    Reqwest(reqwest::Error),
    Json(serde_json::Error),
    UnexpectedStatus(reqwest::StatusCode),
    UrlParse(url::ParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::RequestFailed(msg) => write!(f, "request failed after retries: {msg}"),
            Error::Reqwest(e) => write!(f, "http error: {e}"),
            Error::Json(e) => write!(f, "json error: {e}"),
            Error::UnexpectedStatus(s) => write!(f, "unexpected status: {s}"),
            Error::UrlParse(e) => write!(f, "invalid URL: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Reqwest(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::UrlParse(e)
    }
}
