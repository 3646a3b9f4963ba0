//! Safe header insertion helpers.
//!
//! Static header names for the interceptor's own headers, plus an extension
//! trait that inserts dynamic values without `.parse().unwrap()` at call sites.

use hyper::header::{HeaderName, HeaderValue};
use hyper::Response;

/// Id of the rule that handled the request.
pub static X_INTERCEPTOR_RULE_ID: HeaderName = HeaderName::from_static("x-interceptor-rule-id");
/// Where the body came from: `local`, `remote` or `proxy`.
pub static X_INTERCEPTOR_SOURCE: HeaderName = HeaderName::from_static("x-interceptor-source");

pub trait InterceptorHeadersExt {
    fn set_header(&mut self, name: &HeaderName, value: &HeaderValue);

    /// Insert a header with a dynamic string value.
    /// Returns false if the value couldn't be converted to a valid header value.
    fn set_header_value(&mut self, name: &HeaderName, value: &str) -> bool;
}

impl<B> InterceptorHeadersExt for Response<B> {
    fn set_header(&mut self, name: &HeaderName, value: &HeaderValue) {
        self.headers_mut().insert(name.clone(), value.clone());
    }

    fn set_header_value(&mut self, name: &HeaderName, value: &str) -> bool {
        match HeaderValue::from_str(value) {
            Ok(header_value) => {
                self.headers_mut().insert(name.clone(), header_value);
                true
            }
            Err(_) => {
                tracing::debug!(header = %name, "Skipping invalid header value");
                false
            }
        }
    }
}
