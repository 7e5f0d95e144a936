#[derive(Debug)]
pub enum Error {
    Http(indexer_http::Error),
    Store(indexer_store::Error),
}

impl From<indexer_http::Error> for Error {
    fn from(e: indexer_http::Error) -> Self {
        Error::Http(e)
    }
}

impl From<indexer_store::Error> for Error {
    fn from(e: indexer_store::Error) -> Self {
        Error::Store(e)
    }
}
