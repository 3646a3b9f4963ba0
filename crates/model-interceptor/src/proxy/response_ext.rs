//! Response body type and small constructors shared by both listeners.

use crate::delivery::Delivery;
use crate::error::BoxError;
use futures::TryStreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::header::CONTENT_TYPE;
use hyper::{Response, StatusCode};
use std::convert::Infallible;

/// Body type returned by every handler.
pub type ProxyBody = UnsyncBoxBody<Bytes, BoxError>;

pub fn full_body(bytes: impl Into<Bytes>) -> ProxyBody {
    Full::new(bytes.into())
        .map_err(|never: Infallible| match never {})
        .boxed_unsync()
}

pub fn empty_body() -> ProxyBody {
    Empty::<Bytes>::new()
        .map_err(|never: Infallible| match never {})
        .boxed_unsync()
}

pub fn stream_body(delivery: Delivery) -> ProxyBody {
    StreamBody::new(delivery.map_ok(Frame::data)).boxed_unsync()
}

/// Short `text/plain` diagnostic.
pub fn text_response(status: StatusCode, message: impl Into<String>) -> Response<ProxyBody> {
    let mut response = Response::new(full_body(message.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_text_response() {
        let response = text_response(StatusCode::NOT_FOUND, "not found");
        assert_eq!(response.status(), 404);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"not found");
    }

    #[tokio::test]
    async fn test_stream_body_yields_delivery_bytes() {
        let chunks: Vec<Result<Bytes, BoxError>> =
            vec![Ok(Bytes::from_static(b"ab")), Ok(Bytes::from_static(b"cd"))];
        let body = stream_body(Delivery::new(futures::stream::iter(chunks), Some(4)));
        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(&collected[..], b"abcd");
    }

    #[tokio::test]
    async fn test_empty_body() {
        let collected = empty_body().collect().await.unwrap().to_bytes();
        assert!(collected.is_empty());
    }
}
