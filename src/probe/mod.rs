//! HTTP probing.
//!
//! A probe is one GET against a [`ProbeDescriptor`]. The response headers
//! pick a route through the classifier; playlists and pages are inspected
//! from a capped prefix of the body. Probes are never retried.

mod client;

pub use client::{build_client, get_ok, read_capped, request_error, ClientOptions, MAX_REDIRECTS};

use crate::classify::{self, PageVerdict, PlaylistVerdict, Route};
use crate::error::ScanError;
use crate::output::SuccessRecord;
use crate::types::ProbeDescriptor;
use reqwest::header::{CONTENT_TYPE, SERVER};
use reqwest::{Client, Response};
use std::time::Instant;
use tracing::{debug, info};

/// Largest body prefix read for playlist and page inspection.
pub const BODY_LIMIT: usize = 4 * 1024 * 1024;

/// The single terminal outcome of a probe.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Skip,
    RecordSuccess(SuccessRecord),
    /// Download this descriptor to confirm it streams.
    TriggerVerification(ProbeDescriptor),
}

/// Issues probes and classifies their responses.
#[derive(Debug, Clone)]
pub struct Prober {
    client: Client,
    download_segments: bool,
}

impl Prober {
    /// `download_segments` enables playlist verification by first segment.
    pub fn new(client: Client, download_segments: bool) -> Self {
        Self {
            client,
            download_segments,
        }
    }

    pub async fn probe(&self, descriptor: &ProbeDescriptor) -> ProbeOutcome {
        let url = descriptor.url();
        let started = Instant::now();

        let response = match get_ok(&self.client, &url).await {
            Ok(response) => response,
            Err(e) => {
                log_failure(&e);
                return ProbeOutcome::Skip;
            }
        };

        let content_type = header(&response, CONTENT_TYPE.as_str());
        let server = header(&response, SERVER.as_str());

        match classify::route(content_type.as_deref(), server.as_deref()) {
            Route::Verify => {
                debug!(%url, content_type = ?content_type, server = ?server, "media response");
                ProbeOutcome::TriggerVerification(descriptor.clone())
            }
            Route::Playlist => {
                let Some(body) = read_body(response, &url).await else {
                    return ProbeOutcome::Skip;
                };
                self.on_playlist(descriptor, &body, server.unwrap_or_default(), started)
            }
            Route::Page => {
                let Some(body) = read_body(response, &url).await else {
                    return ProbeOutcome::Skip;
                };
                on_page(descriptor, &body, server.unwrap_or_default(), started)
            }
            Route::Ignore => {
                debug!(%url, content_type = ?content_type, "no recognised content");
                ProbeOutcome::Skip
            }
        }
    }

    fn on_playlist(
        &self,
        descriptor: &ProbeDescriptor,
        body: &str,
        server: String,
        started: Instant,
    ) -> ProbeOutcome {
        match classify::inspect_playlist(body, self.download_segments) {
            PlaylistVerdict::MasterExcluded => {
                info!(url = %descriptor, "master or redirecting playlist, not recorded");
                ProbeOutcome::Skip
            }
            PlaylistVerdict::FetchSegment => {
                let segment = classify::first_segment(body)
                    .and_then(|segment| classify::segment_path(&descriptor.path, segment));
                match segment {
                    Some(path) => ProbeOutcome::TriggerVerification(descriptor.with_path(path)),
                    None => {
                        debug!(url = %descriptor, "playlist has no usable .ts segment");
                        ProbeOutcome::Skip
                    }
                }
            }
            PlaylistVerdict::LiveFastStart => {
                info!(url = %descriptor, "live playlist");
                ProbeOutcome::RecordSuccess(SuccessRecord::new(descriptor, server, started.elapsed()))
            }
            PlaylistVerdict::Unrecognized => ProbeOutcome::Skip,
        }
    }
}

fn on_page(descriptor: &ProbeDescriptor, body: &str, server: String, started: Instant) -> ProbeOutcome {
    match classify::inspect_page(body) {
        PageVerdict::Player => {
            info!(url = %descriptor, "player page");
            ProbeOutcome::RecordSuccess(SuccessRecord::new(descriptor, server, started.elapsed()))
        }
        PageVerdict::NearMatch => {
            info!(url = %descriptor, "page carries a player marker, not recorded");
            ProbeOutcome::Skip
        }
        PageVerdict::Unrecognized => ProbeOutcome::Skip,
    }
}

pub(crate) fn header(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn read_body(response: Response, url: &str) -> Option<String> {
    match read_capped(response, url, BODY_LIMIT).await {
        Ok(body) => Some(body),
        Err(e) => {
            debug!(%url, error = %e, "failed to read body");
            None
        }
    }
}

pub(crate) fn log_failure(err: &ScanError) {
    match err {
        ScanError::RedirectToHttps { .. } => info!(error = %err, "refused HTTPS redirect"),
        ScanError::TooManyRedirects { .. } => info!(error = %err, "redirect limit reached"),
        _ => debug!(error = %err, "probe failed"),
    }
}
