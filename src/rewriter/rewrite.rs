//! Response rewriting.
//!
//! # Responsibilities
//! - Fetch the origin response for an inbound request
//! - Set the nonce-scoped CSP header (or strip CSP on 304)
//! - Replace every `nonce="..."` attribute in HTML bodies
//! - Stream non-HTML bodies through untouched
//!
//! # Design Decisions
//! - Headers are cloned before modification; the origin's map is never edited
//! - Attribute replacement is a plain regex over the text, so it also hits
//!   nonce attributes in inert markup (comments, textarea)
//! - Status, reason phrase and extensions are carried over from the origin

use std::borrow::Cow;
use std::sync::LazyLock;

use axum::body::Body;
use axum::http::header::{
    CONTENT_LENGTH, CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY_REPORT_ONLY, CONTENT_TYPE,
};
use axum::http::{HeaderMap, HeaderValue, Request, Response, StatusCode};
use regex::{Captures, Regex};

use crate::config::RewriterConfig;
use crate::error::ProxyError;
use crate::observability::metrics;
use crate::rewriter::{CspPolicy, Nonce, Upstream};

static NONCE_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"nonce="[^"]*""#).expect("nonce attribute pattern compiles"));

/// How a response was treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// HTML body buffered and rewritten.
    Html,
    /// Body streamed through unchanged.
    Passthrough,
    /// 304: CSP stripped, body untouched.
    NotModified,
}

impl ResponseKind {
    pub fn classify(status: StatusCode, headers: &HeaderMap) -> Self {
        if status == StatusCode::NOT_MODIFIED {
            ResponseKind::NotModified
        } else if is_html(headers) {
            ResponseKind::Html
        } else {
            ResponseKind::Passthrough
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKind::Html => "html",
            ResponseKind::Passthrough => "passthrough",
            ResponseKind::NotModified => "not_modified",
        }
    }
}

/// Case-insensitive `text/html` substring match on `Content-Type`.
pub fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.to_ascii_lowercase().contains("text/html"))
        .unwrap_or(false)
}

/// Replace every `nonce="..."` attribute with the given nonce.
///
/// Returns the rewritten text and the number of replacements.
pub fn replace_nonce_attributes<'a>(html: &'a str, nonce: &Nonce) -> (Cow<'a, str>, usize) {
    let replacement = format!(r#"nonce="{nonce}""#);
    let mut count = 0;
    let rewritten = NONCE_ATTRIBUTE.replace_all(html, |_: &Captures<'_>| {
        count += 1;
        replacement.clone()
    });
    (rewritten, count)
}

/// Fetches from an [`Upstream`] and injects a fresh CSP nonce.
pub struct ResponseRewriter<U> {
    upstream: U,
    policy: CspPolicy,
    max_html_body_bytes: usize,
}

impl<U> ResponseRewriter<U> {
    pub fn new(upstream: U, policy: CspPolicy, max_html_body_bytes: usize) -> Self {
        Self {
            upstream,
            policy,
            max_html_body_bytes,
        }
    }

    pub fn from_config(upstream: U, config: &RewriterConfig) -> Self {
        Self::new(
            upstream,
            CspPolicy::new(config.script_allow_origin.clone()),
            config.max_html_body_bytes,
        )
    }

    /// Apply the nonce to an origin response.
    pub async fn rewrite(
        &self,
        response: Response<Body>,
        nonce: &Nonce,
    ) -> Result<Response<Body>, ProxyError> {
        let (mut parts, body) = response.into_parts();
        let kind = ResponseKind::classify(parts.status, &parts.headers);

        let mut headers = parts.headers.clone();
        if kind == ResponseKind::NotModified {
            headers.remove(CONTENT_SECURITY_POLICY);
            headers.remove(CONTENT_SECURITY_POLICY_REPORT_ONLY);
        } else {
            let value = HeaderValue::try_from(self.policy.render(nonce))?;
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }

        // Content-Type is read from the origin's headers, not the clone.
        if !is_html(&parts.headers) {
            parts.headers = headers;
            return Ok(Response::from_parts(parts, body));
        }

        let bytes = axum::body::to_bytes(body, self.max_html_body_bytes).await?;
        let text = String::from_utf8(bytes.to_vec())?;
        let (rewritten, replaced) = replace_nonce_attributes(&text, nonce);

        tracing::debug!(replaced, status = %parts.status, "Rewrote HTML nonce attributes");
        metrics::record_nonce_replacements(replaced);

        // Untouched bodies keep the origin's length, which also covers HEAD.
        if replaced > 0 {
            headers.remove(CONTENT_LENGTH);
        }
        parts.headers = headers;
        Ok(Response::from_parts(parts, Body::from(rewritten.into_owned())))
    }
}

impl<U: Upstream> ResponseRewriter<U> {
    /// Forward the request, then rewrite the origin's response with a
    /// freshly generated nonce.
    pub async fn handle(&self, request: Request<Body>) -> Result<Response<Body>, ProxyError> {
        let response = self.upstream.fetch(request).await?;
        let nonce = Nonce::generate()?;
        self.rewrite(response, &nonce).await
    }
}
