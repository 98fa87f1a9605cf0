//! HTTP interface to the tweet interaction workflow.
//!
//! | Method & path              | Operation                 |
//! |----------------------------|---------------------------|
//! | `POST /tweets`             | [`tweets::create_tweet`]  |
//! | `DELETE /tweets/{id}`      | [`tweets::delete_tweet`]  |
//! | `POST /tweets/{id}/like`   | [`tweets::like_tweet`]    |
//! | `GET /tweets/{id}/likers`  | [`tweets::tweet_likers`]  |
//! | `POST /tweets/{id}/retweet`| [`tweets::retweet`]       |
//!
//! The caller is identified by the `X-User-Id` and `X-User-Name` headers,
//! which are expected to be set by an authenticating proxy.

use std::borrow::Cow;
use std::convert::Infallible;
use std::future::Future;
use std::panic;
use std::pin::Pin;
use std::task::{Context, Poll};

use diesel::SqliteConnection;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use hyper::body::HttpBody;
use hyper::Body;
use serde::{Deserialize, Serialize};

use crate::models::Actor;
use crate::socket::{Listener, Stream};
use crate::tweets;
use crate::util::r2d2::SqlitePool;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";

const MAX_BODY_LEN: u64 = 64 * 1024;

/// The request handler. Cloning it is cheap.
#[derive(Clone)]
pub struct Api {
    pool: SqlitePool,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: Cow<'static, str>,
}

#[derive(Debug, PartialEq, Eq)]
enum Route {
    Tweets,
    Tweet(i64),
    Like(i64),
    Likers(i64),
    Retweet(i64),
}

#[derive(Deserialize)]
struct AddTweet {
    content: String,
    #[serde(default, alias = "hashTags")]
    hashtags: Option<Vec<AddHashtag>>,
}

#[derive(Deserialize)]
struct AddHashtag {
    content: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: u16,
    message: &'a str,
}

#[allow(clippy::declare_interior_mutable_const)]
const APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");

/// Serves the API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: Listener, pool: SqlitePool, shutdown: F) -> hyper::Result<()>
where
    F: Future<Output = ()>,
{
    let api = Api::new(pool);
    let make_service = hyper::service::make_service_fn(move |_: &Stream| {
        let api = api.clone();
        async move { Ok::<_, Infallible>(api) }
    });
    hyper::Server::builder(listener)
        .serve(make_service)
        .with_graceful_shutdown(shutdown)
        .await
}

impl Api {
    pub fn new(pool: SqlitePool) -> Self {
        Api { pool }
    }

    pub async fn handle(&self, req: Request<Body>) -> Response<Body> {
        let method = req.method().clone();
        let path = req.uri().path().to_owned();

        let res = match self.dispatch(req).await {
            Ok(res) => res,
            Err(e) => e.into_response(),
        };

        info!("{} {} {}", method, path, res.status().as_u16());
        res
    }

    async fn dispatch(&self, req: Request<Body>) -> Result<Response<Body>, ApiError> {
        let route = Route::parse(req.uri().path())?;
        let method = req.method().clone();

        match (route, &method) {
            (Route::Tweets, &Method::POST) => self.add_tweet(req).await,
            (Route::Tweet(id), &Method::DELETE) => {
                actor(&req)?;
                self.blocking(move |conn| tweets::delete_tweet(conn, id))
                    .await?;
                Ok(empty(StatusCode::NO_CONTENT))
            }
            (Route::Like(id), &Method::POST) => {
                let actor = actor(&req)?;
                self.blocking(move |conn| tweets::like_tweet(conn, &actor, id))
                    .await?;
                Ok(empty(StatusCode::NO_CONTENT))
            }
            (Route::Likers(id), &Method::GET) => {
                let likers = self
                    .blocking(move |conn| tweets::tweet_likers(conn, id))
                    .await?;
                json_response(StatusCode::OK, &likers)
            }
            (Route::Retweet(id), &Method::POST) => {
                let actor = actor(&req)?;
                self.blocking(move |conn| tweets::retweet(conn, &actor, id))
                    .await?;
                Ok(empty(StatusCode::NO_CONTENT))
            }
            _ => Err(ApiError::new(
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed",
            )),
        }
    }

    async fn add_tweet(&self, req: Request<Body>) -> Result<Response<Body>, ApiError> {
        let creator = actor(&req)?;

        let body = read_body(req.into_body()).await?;

        let AddTweet { content, hashtags } = json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("Malformed request body: {}", e)))?;
        let hashtags: Vec<String> = hashtags
            .into_iter()
            .flatten()
            .map(|tag| tag.content)
            .collect();

        let tweet = self
            .blocking(move |conn| tweets::create_tweet(conn, &creator, &content, &hashtags))
            .await?;
        json_response(StatusCode::CREATED, &tweet)
    }

    /// Runs `f` with a pooled connection on the blocking thread pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&SqliteConnection) -> crate::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        let result = tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&*conn)
        })
        .await;

        match result {
            Ok(result) => result.map_err(Into::into),
            Err(e) => match e.try_into_panic() {
                Ok(payload) => panic::resume_unwind(payload),
                Err(e) => {
                    error!("a database task was cancelled: {}", e);
                    Err(ApiError::internal())
                }
            },
        }
    }
}

impl tower_service::Service<Request<Body>> for Api {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Body>, Infallible>> + Send>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        trace!("Api::call; req.uri()={:?}", req.uri());
        let api = self.clone();
        Box::pin(async move { Ok(api.handle(req).await) })
    }
}

impl Route {
    fn parse(path: &str) -> Result<Self, ApiError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match *segments {
            ["tweets"] => Ok(Route::Tweets),
            ["tweets", id] => tweet_id(id).map(Route::Tweet),
            ["tweets", id, "like"] => tweet_id(id).map(Route::Like),
            ["tweets", id, "likers"] => tweet_id(id).map(Route::Likers),
            ["tweets", id, "retweet"] => tweet_id(id).map(Route::Retweet),
            _ => Err(ApiError::new(StatusCode::NOT_FOUND, "Not found")),
        }
    }
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, message)
    }

    fn unauthorized(message: &'static str) -> Self {
        ApiError::new(StatusCode::UNAUTHORIZED, message)
    }

    fn payload_too_large() -> Self {
        ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "Request body is too large")
    }

    fn internal() -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_response(self) -> Response<Body> {
        let body = ErrorBody {
            status: self.status.as_u16(),
            message: &self.message,
        };
        match json_response(self.status, &body) {
            Ok(res) => res,
            Err(_) => empty(self.status),
        }
    }
}

impl From<crate::Error> for ApiError {
    fn from(e: crate::Error) -> Self {
        if e.is_client_error() {
            ApiError::new(e.status(), e.to_string())
        } else {
            error!("{}: {:?}", e, e);
            ApiError::internal()
        }
    }
}

fn actor<B>(req: &Request<B>) -> Result<Actor, ApiError> {
    let headers = req.headers();

    let id = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| ApiError::unauthorized("Missing x-user-id header"))?
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or_else(|| ApiError::unauthorized("Invalid x-user-id header"))?;
    let name = headers
        .get(USER_NAME_HEADER)
        .ok_or_else(|| ApiError::unauthorized("Missing x-user-name header"))?;
    let name = String::from_utf8_lossy(name.as_bytes()).into_owned();

    Ok(Actor::new(id, name))
}

/// Collects a request body, giving up as soon as it grows past `MAX_BODY_LEN`.
async fn read_body(mut body: Body) -> Result<Vec<u8>, ApiError> {
    if body.size_hint().lower() > MAX_BODY_LEN {
        return Err(ApiError::payload_too_large());
    }

    let mut buf = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(|e| {
            debug!("failed to load request body: {:?}", e);
            ApiError::bad_request("Failed to read the request body")
        })?;
        if (buf.len() + chunk.len()) as u64 > MAX_BODY_LEN {
            return Err(ApiError::payload_too_large());
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf)
}

fn tweet_id(segment: &str) -> Result<i64, ApiError> {
    segment
        .parse()
        .map_err(|_| crate::Error::InvalidTweetId.into())
}

fn empty(status: StatusCode) -> Response<Body> {
    let mut res = Response::new(Body::empty());
    *res.status_mut() = status;
    res
}

fn json_response<T: Serialize + ?Sized>(
    status: StatusCode,
    value: &T,
) -> Result<Response<Body>, ApiError> {
    let body = json::to_vec(value).map_err(|e| {
        error!("failed to serialize a response: {:?}", e);
        ApiError::internal()
    })?;
    let mut res = Response::new(Body::from(body));
    *res.status_mut() = status;
    res.headers_mut().insert(CONTENT_TYPE, APPLICATION_JSON);
    Ok(res)
}
