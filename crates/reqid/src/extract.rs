//! The request identifier as seen by downstream handlers.

use std::fmt;
use std::ops::Deref;

use axum::extract::FromRequestParts;
use http::request::Parts;
use http::Extensions;

use crate::error::RequestIdError;

/// Identifier attached to a request by the [`Assigner`](crate::Assigner).
///
/// Stored in the request extensions before any downstream handler runs, so
/// handlers can take it as an extractor:
///
/// ```rust,ignore
/// async fn handler(request_id: RequestId) -> String {
///     request_id.to_string()
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Look up the identifier in a request's extensions.
    ///
    /// For tower layers and other consumers that see the raw extensions
    /// rather than going through an axum extractor.
    pub fn from_extensions(extensions: &Extensions) -> Option<&RequestId> {
        extensions.get::<RequestId>()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for RequestId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = RequestIdError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        RequestId::from_extensions(&parts.extensions)
            .cloned()
            .ok_or(RequestIdError::Missing)
    }
}
