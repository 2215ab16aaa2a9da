//! Content-signature classification.
//!
//! Pure functions over response headers and body text. Every decision is an
//! ordered rule table evaluated first-match-wins, so precedence can be read
//! top to bottom and tested without any network I/O.

/// Where a `200 OK` response goes next, decided from its headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Media content: verify by downloading.
    Verify,
    /// HLS playlist: inspect the body.
    Playlist,
    /// HTML or JSON page: inspect the body.
    Page,
    /// Nothing recognisable.
    Ignore,
}

const MEDIA_TYPES: &[&str] = &["x-flv", "video"];
const PLAYLIST_TYPES: &[&str] = &["mpegurl"];
const PAGE_TYPES: &[&str] = &["text", "application/json"];

/// Route a response by `Content-Type`, falling back to the `Server` header.
///
/// Content types are matched by case-sensitive substring in priority order,
/// so `application/x-mpegURL` is not a playlist. A `udpxy` server is verified
/// when the content type decided nothing.
pub fn route(content_type: Option<&str>, server: Option<&str>) -> Route {
    let content_type = content_type.unwrap_or_default();
    let table: [(&[&str], Route); 3] = [
        (MEDIA_TYPES, Route::Verify),
        (PLAYLIST_TYPES, Route::Playlist),
        (PAGE_TYPES, Route::Page),
    ];

    for (needles, route) in table {
        if needles.iter().any(|n| content_type.contains(n)) {
            return route;
        }
    }

    match server {
        Some(server) if server.contains("udpxy") => Route::Verify,
        _ => Route::Ignore,
    }
}

/// Outcome of inspecting a playlist body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistVerdict {
    /// Master or redirecting playlist; excluded as noise.
    MasterExcluded,
    /// Media playlist whose first segment should be downloaded.
    FetchSegment,
    /// Live fast-start playlist; recorded without downloading.
    LiveFastStart,
    /// No rule matched.
    Unrecognized,
}

/// The `Ret/Reason` status object some middleware returns in place of a playlist.
const RET_REASON_MARKER: &str = r#""Ret":20102,"Reason":""#;

/// Substring markers found in a playlist body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaylistMarkers {
    pub version: bool,
    pub stream_inf: bool,
    pub default_vhost: bool,
    pub independent_segments: bool,
    pub extinf: bool,
    pub absolute_http: bool,
    pub ret_reason: bool,
}

impl PlaylistMarkers {
    pub fn scan(body: &str) -> Self {
        Self {
            version: body.contains("EXT-X-VERSION"),
            stream_inf: body.contains("EXT-X-STREAM-INF"),
            default_vhost: body.contains("_defaultVhost_"),
            independent_segments: body.contains("EXT-X-INDEPENDENT-SEGMENTS"),
            extinf: body.contains("EXTINF"),
            absolute_http: body.contains("http://"),
            ret_reason: body.contains(RET_REASON_MARKER),
        }
    }
}

type PlaylistRule = fn(&PlaylistMarkers, bool) -> bool;

/// Playlist rules in evaluation order. Reordering changes outcomes: the
/// segment download rule deliberately shadows part of the fast-start rule.
const PLAYLIST_RULES: &[(PlaylistRule, PlaylistVerdict)] = &[
    (
        |m, _| {
            (m.version && m.stream_inf && !m.independent_segments)
                || (m.stream_inf && m.default_vhost)
                || (m.stream_inf && m.absolute_http)
        },
        PlaylistVerdict::MasterExcluded,
    ),
    (
        |m, download| download && !m.stream_inf && !m.ret_reason,
        PlaylistVerdict::FetchSegment,
    ),
    (
        |m, _| {
            (m.version && m.extinf)
                || m.stream_inf
                || m.ret_reason
                || (m.version && m.independent_segments)
        },
        PlaylistVerdict::LiveFastStart,
    ),
];

/// Classify a playlist body. `download_segments` enables segment verification.
pub fn inspect_playlist(body: &str, download_segments: bool) -> PlaylistVerdict {
    let markers = PlaylistMarkers::scan(body);
    PLAYLIST_RULES
        .iter()
        .find(|(rule, _)| rule(&markers, download_segments))
        .map_or(PlaylistVerdict::Unrecognized, |(_, verdict)| *verdict)
}

/// Outcome of inspecting an HTML or JSON page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageVerdict {
    /// Player page or stream status object; recorded.
    Player,
    /// Exactly the kind of page we look for, but incomplete; logged only.
    NearMatch,
    Unrecognized,
}

/// Substring markers found in a page body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageMarkers {
    pub page_prefix: bool,
    pub page_js: bool,
    pub ret: bool,
    pub reason: bool,
    pub extinf: bool,
    pub version: bool,
}

impl PageMarkers {
    pub fn scan(body: &str) -> Self {
        Self {
            page_prefix: body.contains(r#"window.PAGE_PREFIX = "player-""#),
            page_js: body.contains(r#"window.PAGE_JS = "mylive.html.js""#),
            ret: body.contains(r#""Ret":"#),
            reason: body.contains(r#""Reason":"#),
            extinf: body.contains("EXTINF"),
            version: body.contains("EXT-X-VERSION"),
        }
    }
}

type PageRule = fn(&PageMarkers) -> bool;

const PAGE_RULES: &[(PageRule, PageVerdict)] = &[
    (
        |m| (m.page_prefix && m.page_js) || (m.ret && m.reason) || (m.extinf && m.version),
        PageVerdict::Player,
    ),
    (
        |m| m.page_prefix || m.page_js || m.ret || m.reason,
        PageVerdict::NearMatch,
    ),
];

/// Classify an HTML/JSON page body.
pub fn inspect_page(body: &str) -> PageVerdict {
    let markers = PageMarkers::scan(body);
    PAGE_RULES
        .iter()
        .find(|(rule, _)| rule(&markers))
        .map_or(PageVerdict::Unrecognized, |(_, verdict)| *verdict)
}

/// The first non-comment playlist line that references a `.ts` segment.
pub fn first_segment(body: &str) -> Option<&str> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .find(|line| line.contains(".ts"))
}

/// Resolve a segment reference against the directory of the playlist path.
///
/// Paths are relative to the server root without a leading slash. A segment
/// starting with `/` is taken from the root as is. Returns `None` for
/// absolute URLs, which point away from the probed endpoint.
pub fn segment_path(playlist_path: &str, segment: &str) -> Option<String> {
    if segment.contains("://") {
        return None;
    }
    if let Some(rooted) = segment.strip_prefix('/') {
        return Some(rooted.to_string());
    }

    let path = playlist_path.split('?').next().unwrap_or_default();
    let joined = match path.rfind('/') {
        Some(idx) => format!("{}/{}", &path[..idx], segment),
        None => segment.to_string(),
    };
    Some(joined.replace("./", ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_priority() {
        assert_eq!(route(Some("video/x-flv"), None), Route::Verify);
        assert_eq!(route(Some("video/MP2T"), None), Route::Verify);
        assert_eq!(route(Some("application/vnd.apple.mpegurl"), None), Route::Playlist);
        assert_eq!(route(Some("text/html; charset=utf-8"), None), Route::Page);
        assert_eq!(route(Some("application/json"), None), Route::Page);
        assert_eq!(route(Some("application/octet-stream"), None), Route::Ignore);
        assert_eq!(route(None, None), Route::Ignore);
    }

    #[test]
    fn test_route_is_case_sensitive() {
        assert_eq!(route(Some("application/x-mpegURL"), None), Route::Ignore);
        assert_eq!(route(Some("Video/MP2T"), None), Route::Ignore);
        assert_eq!(route(Some("Text/HTML"), None), Route::Ignore);
        assert_eq!(route(Some("application/x-mpegURL"), Some("udpxy")), Route::Verify);
    }

    #[test]
    fn test_route_udpxy_fallback() {
        assert_eq!(route(Some("application/octet-stream"), Some("udpxy 1.0-23.12")), Route::Verify);
        assert_eq!(route(None, Some("udpxy")), Route::Verify);
        // Content type wins over the server header.
        assert_eq!(route(Some("text/html"), Some("udpxy")), Route::Page);
        assert_eq!(route(None, Some("nginx")), Route::Ignore);
    }

    const MEDIA_PLAYLIST: &str = "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10\n\
        #EXTINF:10.0,\n./seg_0001.ts?token=1\n#EXTINF:10.0,\nseg_0002.ts\n";

    const MASTER_PLAYLIST: &str = "#EXTM3U\n#EXT-X-VERSION:3\n\
        #EXT-X-STREAM-INF:BANDWIDTH=800000\nhigh/index.m3u8\n";

    #[test]
    fn test_master_playlists_are_excluded() {
        assert_eq!(inspect_playlist(MASTER_PLAYLIST, true), PlaylistVerdict::MasterExcluded);

        let vhost = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1\n_defaultVhost_/live.m3u8\n";
        assert_eq!(inspect_playlist(vhost, false), PlaylistVerdict::MasterExcluded);

        let redirect = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1\nhttp://10.0.0.1/live.m3u8\n";
        assert_eq!(inspect_playlist(redirect, true), PlaylistVerdict::MasterExcluded);
    }

    #[test]
    fn test_stream_inf_with_independent_segments_is_live() {
        let body = "#EXTM3U\n#EXT-X-VERSION:6\n#EXT-X-INDEPENDENT-SEGMENTS\n\
            #EXT-X-STREAM-INF:BANDWIDTH=1\nlow.m3u8\n";
        assert_eq!(inspect_playlist(body, true), PlaylistVerdict::LiveFastStart);
    }

    #[test]
    fn test_media_playlist_download_toggle() {
        assert_eq!(inspect_playlist(MEDIA_PLAYLIST, true), PlaylistVerdict::FetchSegment);
        assert_eq!(inspect_playlist(MEDIA_PLAYLIST, false), PlaylistVerdict::LiveFastStart);
    }

    #[test]
    fn test_ret_reason_marker() {
        let body = r#"{"Ret":20102,"Reason":"live not started"}"#;
        assert_eq!(inspect_playlist(body, true), PlaylistVerdict::LiveFastStart);
        assert_eq!(inspect_playlist(body, false), PlaylistVerdict::LiveFastStart);
    }

    #[test]
    fn test_playlist_without_markers() {
        assert_eq!(inspect_playlist("#EXTM3U\n", false), PlaylistVerdict::Unrecognized);
        // With downloads enabled the segment rule still fires; the caller
        // then finds no segment and drops the probe.
        assert_eq!(inspect_playlist("#EXTM3U\n", true), PlaylistVerdict::FetchSegment);
    }

    #[test]
    fn test_stream_inf_and_extinf_scenario() {
        let body = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1\n#EXTINF:5,\nlive.ts\n";
        assert_eq!(inspect_playlist(body, true), PlaylistVerdict::LiveFastStart);
    }

    #[test]
    fn test_classification_is_deterministic() {
        for body in [MEDIA_PLAYLIST, MASTER_PLAYLIST, "", "EXT-X-VERSION"] {
            for download in [true, false] {
                let first = inspect_playlist(body, download);
                assert!((0..5).all(|_| inspect_playlist(body, download) == first));
            }
        }
    }

    #[test]
    fn test_page_rules() {
        let player = r#"<script>window.PAGE_PREFIX = "player-"; window.PAGE_JS = "mylive.html.js";</script>"#;
        assert_eq!(inspect_page(player), PageVerdict::Player);
        assert_eq!(inspect_page(r#"{"Ret":0,"Reason":"ok"}"#), PageVerdict::Player);
        assert_eq!(inspect_page("#EXTINF:10,\n#EXT-X-VERSION:3"), PageVerdict::Player);

        assert_eq!(
            inspect_page(r#"window.PAGE_PREFIX = "player-""#),
            PageVerdict::NearMatch
        );
        assert_eq!(inspect_page(r#"{"Ret":1}"#), PageVerdict::NearMatch);
        assert_eq!(inspect_page("EXTINF only"), PageVerdict::Unrecognized);
        assert_eq!(inspect_page("<html></html>"), PageVerdict::Unrecognized);
    }

    #[test]
    fn test_first_segment() {
        assert_eq!(first_segment(MEDIA_PLAYLIST), Some("./seg_0001.ts?token=1"));
        assert_eq!(first_segment("#EXTM3U\n#EXT-X-MAP:URI=\"a.ts\"\n"), None);
    }

    #[test]
    fn test_segment_path() {
        assert_eq!(segment_path("live.m3u8", "seg.ts").as_deref(), Some("seg.ts"));
        assert_eq!(
            segment_path("hls/ch1/index.m3u8?k=v", "./seg_1.ts").as_deref(),
            Some("hls/ch1/seg_1.ts")
        );
        assert_eq!(segment_path("a/b.m3u8", "/root/seg.ts").as_deref(), Some("root/seg.ts"));
        assert_eq!(segment_path("a/b.m3u8", "http://cdn/seg.ts"), None);
    }
}
