use http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid tweet id")]
    InvalidTweetId,
    #[error("the username is already taken")]
    UsernameTaken,
    #[error("database query failed")]
    Query(#[from] diesel::result::Error),
    #[error("failed to retrieve a connection from the connection pool")]
    Pool(#[from] diesel::r2d2::PoolError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The HTTP status code that the error is reported with.
    pub fn status(&self) -> StatusCode {
        match *self {
            Error::InvalidTweetId => StatusCode::BAD_REQUEST,
            Error::UsernameTaken => StatusCode::CONFLICT,
            Error::Query(_) | Error::Pool(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the error message may be shown to the client.
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}
