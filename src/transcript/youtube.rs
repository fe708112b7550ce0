//! YouTube caption source.
//!
//! yt-dlp lists the caption tracks of a video; the chosen track is downloaded in YouTube's
//! `json3` timed-text format and flattened into segments.

use super::{Transcript, TranscriptSegment, TranscriptSource};
use crate::config::TranscriptSettings;
use crate::error::{Result, VidaskError};
use crate::retry::RetryPolicy;
use crate::video::VideoId;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, info, instrument, warn};

// yt-dlp reports these for videos that will never resolve, whatever the network does.
const UNAVAILABLE_MARKERS: &[&str] = &[
    "video unavailable",
    "private video",
    "has been removed",
    "does not exist",
    "http error 404",
];

const NETWORK_MARKERS: &[&str] = &[
    "unable to download",
    "urlopen error",
    "timed out",
    "connection reset",
    "temporary failure in name resolution",
    "http error 429",
    "too many requests",
];

static HTTP_5XX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http error 5\d\d").expect("Invalid regex"));

/// Transcript source backed by yt-dlp and YouTube timed text.
pub struct YoutubeTranscriptSource {
    settings: TranscriptSettings,
    http: reqwest::Client,
    retry: RetryPolicy,
}

/// Subset of `yt-dlp --dump-json` output.
#[derive(Debug, Default, Deserialize)]
struct VideoInfo {
    title: Option<String>,
    subtitles: Option<HashMap<String, Vec<CaptionFormat>>>,
    automatic_captions: Option<HashMap<String, Vec<CaptionFormat>>>,
}

#[derive(Debug, Clone, Deserialize)]
struct CaptionFormat {
    #[serde(default)]
    ext: String,
    #[serde(default)]
    url: String,
}

/// The caption track picked for download.
#[derive(Debug, Clone, PartialEq)]
struct CaptionTrack {
    language: String,
    url: String,
    automatic: bool,
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

impl YoutubeTranscriptSource {
    pub fn new(settings: TranscriptSettings, retry: RetryPolicy) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(retry.timeout)
            .build()
            .map_err(|e| VidaskError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            settings,
            http,
            retry,
        })
    }

    /// Read the caption listing with yt-dlp.
    async fn fetch_info(&self, video_id: &VideoId) -> Result<VideoInfo> {
        let output = tokio::process::Command::new(&self.settings.ytdlp_path)
            .args([
                "--dump-json",
                "--skip-download",
                "--no-warnings",
                "--no-playlist",
                video_id.watch_url().as_str(),
            ])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    VidaskError::ToolNotFound(self.settings.ytdlp_path.clone())
                } else {
                    VidaskError::TransientNetwork(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("yt-dlp failed for {}: {}", video_id, stderr.trim());
            return Err(ytdlp_failure(video_id, &stderr));
        }

        let info: VideoInfo = serde_json::from_slice(&output.stdout)?;
        Ok(info)
    }

    /// Download a json3 caption track.
    async fn fetch_track(&self, track: &CaptionTrack) -> Result<String> {
        let response = self
            .http
            .get(&track.url)
            .send()
            .await
            .map_err(|e| VidaskError::TransientNetwork(format!("Caption download failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VidaskError::TransientNetwork(format!(
                "Caption download returned HTTP {}",
                status
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptSource {
    #[instrument(skip(self), fields(video_id = %video_id))]
    async fn fetch(&self, video_id: &VideoId) -> Result<Transcript> {
        let info = self
            .retry
            .run("caption listing", || self.fetch_info(video_id))
            .await?;

        let track = select_track(&info, &self.settings.language, self.settings.allow_auto_captions)
            .ok_or_else(|| VidaskError::NoTranscript {
                video_id: video_id.to_string(),
                reason: format!("no '{}' caption track", self.settings.language),
            })?;

        info!(
            "Using {} captions ({})",
            if track.automatic { "automatic" } else { "manual" },
            track.language
        );

        let body = self
            .retry
            .run("caption download", || self.fetch_track(&track))
            .await?;

        let segments = parse_json3(&body)?;
        debug!("Parsed {} caption segments", segments.len());

        if segments.is_empty() {
            return Err(VidaskError::NoTranscript {
                video_id: video_id.to_string(),
                reason: "caption track is empty".to_string(),
            });
        }

        Ok(Transcript {
            video_id: video_id.clone(),
            title: info.title,
            language: track.language,
            segments,
        })
    }
}

/// Classify a failed yt-dlp run. Network trouble stays retryable; anything else means the
/// video cannot be resolved.
fn ytdlp_failure(video_id: &VideoId, stderr: &str) -> VidaskError {
    let reason = stderr
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .unwrap_or("yt-dlp exited with an error")
        .to_string();

    let lower = stderr.to_ascii_lowercase();
    let unavailable = UNAVAILABLE_MARKERS.iter().any(|m| lower.contains(m));
    let network = NETWORK_MARKERS.iter().any(|m| lower.contains(m)) || HTTP_5XX.is_match(&lower);

    if network && !unavailable {
        VidaskError::TransientNetwork(format!("yt-dlp could not reach YouTube: {}", reason))
    } else {
        VidaskError::VideoNotFound {
            video_id: video_id.to_string(),
            reason,
        }
    }
}

/// Pick a manual track before an automatic one; within each, an exact language match
/// before a regional variant (`en` before `en-GB`).
fn select_track(info: &VideoInfo, language: &str, allow_auto: bool) -> Option<CaptionTrack> {
    let mut sources = vec![(info.subtitles.as_ref(), false)];
    if allow_auto {
        sources.push((info.automatic_captions.as_ref(), true));
    }

    let prefix = format!("{}-", language);

    for (tracks, automatic) in sources {
        let Some(tracks) = tracks else { continue };

        let mut variants: Vec<&String> = tracks
            .keys()
            .filter(|lang| lang.starts_with(&prefix))
            .collect();
        variants.sort();

        let candidates = tracks
            .get_key_value(language)
            .map(|(lang, _)| lang)
            .into_iter()
            .chain(variants);

        for lang in candidates {
            if let Some(url) = tracks.get(lang).and_then(|formats| json3_url(formats)) {
                return Some(CaptionTrack {
                    language: lang.clone(),
                    url,
                    automatic,
                });
            }
        }
    }

    None
}

/// URL of the json3 rendition, rewriting another format's URL when needed.
fn json3_url(formats: &[CaptionFormat]) -> Option<String> {
    if let Some(f) = formats.iter().find(|f| f.ext == "json3" && !f.url.is_empty()) {
        return Some(f.url.clone());
    }

    let other = formats.iter().find(|f| !f.url.is_empty())?;
    let mut url = url::Url::parse(&other.url).ok()?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "fmt")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("fmt", "json3");
    Some(url.to_string())
}

/// Flatten json3 events into segments, dropping empty ones.
fn parse_json3(body: &str) -> Result<Vec<TranscriptSegment>> {
    let doc: Json3 = serde_json::from_str(body)?;

    Ok(doc
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs?.into_iter().map(|s| s.utf8).collect();
            let text = text.replace('\n', " ");
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSegment::new(
                text,
                event.t_start_ms as f64 / 1000.0,
                event.d_duration_ms as f64 / 1000.0,
            ))
        })
        .collect())
}
