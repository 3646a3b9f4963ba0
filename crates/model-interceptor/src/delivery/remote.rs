//! Remote delivery: fetch a URL and stream its body through.

use super::{sanitize_filename, Delivery, Payload, OCTET_STREAM};
use crate::config::UpstreamClientConfig;
use crate::error::{BoxError, UpstreamFailure};
use crate::proxy::HttpClient;
use futures::{future, TryStreamExt};
use http_body_util::{BodyStream, Empty};
use hyper::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, LOCATION, USER_AGENT};
use hyper::{Request, StatusCode, Uri};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Issues single-attempt GETs for rule targets and proxied URLs.
#[derive(Clone)]
pub struct RemoteFetcher {
    client: HttpClient,
    user_agent: HeaderValue,
    timeout: Duration,
    max_redirects: usize,
}

impl RemoteFetcher {
    pub fn new(client: HttpClient, config: &UpstreamClientConfig) -> Result<Self, anyhow::Error> {
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| anyhow::anyhow!("Invalid user agent '{}': {e}", config.user_agent))?;
        Ok(Self {
            client,
            user_agent,
            timeout: Duration::from_secs(config.request_timeout_secs),
            max_redirects: config.max_redirects,
        })
    }

    /// GET `target`, following redirects, and stream the final response body.
    ///
    /// Not retried: any failure is returned immediately.
    pub async fn fetch(&self, target: &Url) -> Result<Payload, UpstreamFailure> {
        let mut current = target.clone();

        for _ in 0..=self.max_redirects {
            let response = self.send(&current).await?;
            let status = response.status();

            if is_followed_redirect(status) {
                if let Some(next) = redirect_location(&current, response.headers().get(LOCATION)) {
                    debug!(from = %current, to = %next, status = status.as_u16(), "Following redirect");
                    current = next;
                    continue;
                }
            }

            if !status.is_success() {
                return Err(UpstreamFailure::with_status(target.as_str(), status));
            }

            return Ok(into_payload(target, response));
        }

        Err(UpstreamFailure::new(
            target.as_str(),
            format!("Too many redirects (limit {})", self.max_redirects),
        ))
    }

    async fn send(
        &self,
        url: &Url,
    ) -> Result<hyper::Response<hyper::body::Incoming>, UpstreamFailure> {
        let mut without_fragment = url.clone();
        without_fragment.set_fragment(None);
        let uri: Uri = without_fragment
            .as_str()
            .parse()
            .map_err(|e| UpstreamFailure::new(url.as_str(), format!("Invalid URL: {e}")))?;

        let request = Request::get(uri)
            .header(USER_AGENT, self.user_agent.clone())
            .body(Empty::new())
            .map_err(|e| UpstreamFailure::new(url.as_str(), e.to_string()))?;

        match tokio::time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(UpstreamFailure::new(url.as_str(), describe_client_error(&e))),
            Err(_) => Err(UpstreamFailure::new(
                url.as_str(),
                format!("Timed out after {}s", self.timeout.as_secs()),
            )),
        }
    }
}

fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

fn redirect_location(base: &Url, location: Option<&HeaderValue>) -> Option<Url> {
    let location = location?.to_str().ok()?;
    let next = base.join(location).ok()?;
    matches!(next.scheme(), "http" | "https").then_some(next)
}

fn describe_client_error(e: &hyper_util::client::legacy::Error) -> String {
    use std::error::Error;
    match e.source() {
        Some(source) => format!("{e}: {source}"),
        None => e.to_string(),
    }
}

/// Last path segment of the target URL, if it names something.
pub(crate) fn filename_from_url(url: &Url) -> Option<String> {
    url.path_segments()?
        .last()
        .filter(|segment| !segment.is_empty())
        .and_then(sanitize_filename)
}

fn into_payload(target: &Url, response: hyper::Response<hyper::body::Incoming>) -> Payload {
    let (parts, body) = response.into_parts();

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(OCTET_STREAM)
        .to_string();
    let content_length = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let url = target.to_string();
    let stream = BodyStream::new(body)
        .try_filter_map(|frame| future::ready(Ok(frame.into_data().ok())))
        .map_err(move |e| {
            Box::new(UpstreamFailure::new(
                url.clone(),
                format!("Stream interrupted: {e}"),
            )) as BoxError
        });

    Payload {
        content_type,
        content_length,
        filename: filename_from_url(target),
        body: Delivery::new(stream, content_length),
    }
}
