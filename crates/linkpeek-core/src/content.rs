#![forbid(unsafe_code)]

//! Content strategy for the preview frame.
//!
//! A URL becomes either a muted, autoplaying video embed or a generic frame
//! pointed straight at the target. Generic frames are observed: once the
//! frame reports loaded, the host probes its document and hands back a
//! [`FrameProbe`]. A blocked probe (cross-origin) or an explicit load error
//! switches the window to the fallback notice.

use std::sync::OnceLock;

use regex_lite::Regex;

/// Frame target that stops media playback and network activity.
pub const INERT_URL: &str = "about:blank";

/// `allow` attribute for video embeds.
pub const VIDEO_ALLOW: &str = "autoplay; encrypted-media";

const VIDEO_EMBED_BASE: &str = "https://www.youtube.com/embed/";
const VIDEO_EMBED_PARAMS: &str = "?autoplay=1&mute=1";

fn video_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?:https?://)?(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:[^#]*&)?v=|embed/|shorts/)|youtu\.be/)([A-Za-z0-9_-]+)",
        )
        .expect("video host pattern is valid")
    })
}

/// Extract a YouTube video identifier from `url`.
#[must_use]
pub fn video_id(url: &str) -> Option<&str> {
    video_pattern()
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// How the frame renders its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    /// Video embed for the given identifier.
    Video { id: String },
    /// The target page itself.
    Generic,
}

/// Frame source plus the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDescriptor {
    pub kind: ContentKind,
    /// Value for the frame's `src`.
    pub src: String,
    /// The URL the user asked for.
    pub target: String,
}

impl ContentDescriptor {
    /// Whether the host must attach load/error observers to the frame.
    #[must_use]
    pub fn is_observed(&self) -> bool {
        matches!(self.kind, ContentKind::Generic)
    }

    /// `allow` attribute the frame needs, if any.
    #[must_use]
    pub fn allow(&self) -> Option<&'static str> {
        match self.kind {
            ContentKind::Video { .. } => Some(VIDEO_ALLOW),
            ContentKind::Generic => None,
        }
    }

    #[must_use]
    pub fn is_video(&self) -> bool {
        matches!(self.kind, ContentKind::Video { .. })
    }
}

/// Pick the content strategy for `url`.
#[must_use]
pub fn load(url: &str) -> ContentDescriptor {
    match video_id(url) {
        Some(id) => ContentDescriptor {
            src: format!("{VIDEO_EMBED_BASE}{id}{VIDEO_EMBED_PARAMS}"),
            kind: ContentKind::Video { id: id.to_owned() },
            target: url.to_owned(),
        },
        None => ContentDescriptor {
            kind: ContentKind::Generic,
            src: url.to_owned(),
            target: url.to_owned(),
        },
    }
}

/// Result of introspecting the frame's document after it reported loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameProbe {
    /// Same-origin document; rendering confirmed and clicks observable.
    Accessible,
    /// Introspection refused, treated as a render failure.
    Blocked,
}

/// Render state of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentState {
    /// Observed frame waiting for its load signal.
    Loading,
    /// Video embed; never probed.
    Embedded,
    /// Load confirmed.
    Rendered,
    /// Frame hidden behind the fallback notice.
    Fallback,
}

impl ContentState {
    /// State right after `descriptor` is handed to the frame.
    #[must_use]
    pub fn initial(descriptor: &ContentDescriptor) -> Self {
        if descriptor.is_observed() {
            Self::Loading
        } else {
            Self::Embedded
        }
    }

    /// State after a load signal with the given probe result.
    ///
    /// Later loads (in-frame navigation) are probed again, so a rendered
    /// frame can still fall back.
    #[must_use]
    pub fn on_loaded(self, probe: FrameProbe) -> Self {
        match (self, probe) {
            (Self::Embedded | Self::Fallback, _) => self,
            (_, FrameProbe::Accessible) => Self::Rendered,
            (_, FrameProbe::Blocked) => Self::Fallback,
        }
    }

    /// State after an explicit load error.
    #[must_use]
    pub fn on_error(self) -> Self {
        match self {
            Self::Embedded => self,
            _ => Self::Fallback,
        }
    }
}
