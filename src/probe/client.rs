//! HTTP client construction and request error mapping.

use crate::error::{ScanError, ScanResult};
use reqwest::header::HeaderMap;
use reqwest::redirect::{Attempt, Policy};
use reqwest::{Client, Response, StatusCode};
use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;

/// Redirect hops followed before giving up.
pub const MAX_REDIRECTS: usize = 5;

/// Why the redirect policy stopped following.
#[derive(Debug, Error)]
enum RedirectRefused {
    #[error("redirect from {from} to HTTPS {to}")]
    ToHttps { from: String, to: String },
    #[error("stopped after {0} redirects")]
    TooMany(usize),
}

/// Options shared by probe and verification requests.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Connect timeout and overall request timeout.
    pub timeout: Duration,
    /// Headers sent with every request.
    pub headers: HeaderMap,
}

/// Build the client used for every request of a run.
///
/// Certificate checks are off, idle connections are reused and redirects are
/// followed for at most [`MAX_REDIRECTS`] hops, never from `http` to `https`.
pub fn build_client(options: &ClientOptions) -> ScanResult<Client> {
    Client::builder()
        .connect_timeout(options.timeout)
        .timeout(options.timeout)
        .danger_accept_invalid_certs(true)
        .default_headers(options.headers.clone())
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(30))
        .redirect(Policy::custom(redirect_policy))
        .build()
        .map_err(|e| ScanError::ClientBuild(e.to_string()))
}

fn redirect_policy(attempt: Attempt) -> reqwest::redirect::Action {
    if attempt.previous().len() >= MAX_REDIRECTS {
        return attempt.error(RedirectRefused::TooMany(MAX_REDIRECTS));
    }

    let from_http = attempt
        .previous()
        .last()
        .map_or(false, |url| url.scheme() == "http");
    if from_http && attempt.url().scheme() == "https" {
        let refused = RedirectRefused::ToHttps {
            from: attempt.previous().last().map(|u| u.to_string()).unwrap_or_default(),
            to: attempt.url().to_string(),
        };
        return attempt.error(refused);
    }

    attempt.follow()
}

/// Send a GET to `url` and require `200 OK`.
pub async fn get_ok(client: &Client, url: &str) -> ScanResult<Response> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| request_error(url, e))?;

    if response.status() != StatusCode::OK {
        return Err(ScanError::UnexpectedStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }
    Ok(response)
}

/// Read at most `limit` bytes of the body as lossy UTF-8.
pub async fn read_capped(mut response: Response, url: &str, limit: usize) -> ScanResult<String> {
    let mut body = Vec::new();
    while body.len() < limit {
        match response.chunk().await.map_err(|e| request_error(url, e))? {
            Some(chunk) => body.extend_from_slice(&chunk),
            None => break,
        }
    }
    body.truncate(limit);
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Map a transport error, keeping redirect refusals distinct.
pub fn request_error(url: &str, err: reqwest::Error) -> ScanError {
    if err.is_redirect() {
        let mut source = err.source();
        while let Some(cause) = source {
            if let Some(refused) = cause.downcast_ref::<RedirectRefused>() {
                return match refused {
                    RedirectRefused::ToHttps { .. } => ScanError::RedirectToHttps {
                        url: url.to_string(),
                    },
                    RedirectRefused::TooMany(_) => ScanError::TooManyRedirects {
                        url: url.to_string(),
                    },
                };
            }
            source = cause.source();
        }
    }

    if err.is_timeout() {
        return ScanError::Timeout(url.to_string());
    }

    ScanError::RequestFailed {
        url: url.to_string(),
        reason: err.to_string(),
    }
}
