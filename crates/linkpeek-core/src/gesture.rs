#![forbid(unsafe_code)]

//! Link gesture classification: decides whether a press on a link is an
//! ordinary click or a request to open a preview.
//!
//! [`GestureClassifier`] consumes pointer-down/move/up signals from the host
//! and produces [`GestureEffect`]s. It never touches the page; the host
//! applies each effect in order.
//!
//! # State Machine
//!
//! ```text
//! Idle ──down on link──▶ Tracking ──threshold / hold timer──▶ Armed
//!                          │                                    │
//!                          └──────────── pointer-up ────────────┤
//!                                                               ▼
//!                         Idle ◀──────── settle timer ──────── Settling
//! ```
//!
//! - **Drag mode**: the session arms once the pointer travels further than
//!   the drag threshold (Euclidean). Half the threshold shows a hint on the
//!   link.
//! - **Hold mode**: the session arms when the hold timer fires while the
//!   pointer is still down.
//!
//! # Invariants
//!
//! 1. At most one session exists. A new pointer-down tears the previous one
//!    down (timers cancelled, hint and selection lock cleared) before the new
//!    session starts.
//! 2. A session requests at most one preview.
//! 3. Pointer-up is processed once per session.
//! 4. A click is suppressed only when the session produced a preview, and
//!    then only once.
//! 5. Timer callbacks carry the session generation; stale callbacks are
//!    ignored.
//!
//! # Failure Modes
//!
//! - A press shorter than the hold delay cancels the hold timer; the click
//!   passes through untouched and later clicks are never suppressed.
//! - If the host never delivers pointer-up (e.g. the pointer leaves the
//!   document), the session lingers until the next pointer-down supersedes it.

use core::time::Duration;

use bitflags::bitflags;
use tracing::{debug, trace};

use crate::geometry::Point;

/// Delay before a stationary press opens a preview in hold mode.
pub const HOLD_DELAY: Duration = Duration::from_millis(500);
/// Delay between pointer-up and session teardown.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);
/// Fraction of the drag threshold at which the drag hint appears.
pub const HINT_RATIO: f64 = 0.5;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Timing knobs for gesture classification.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    /// Hold-mode delay (default: 500ms).
    pub hold_delay: Duration,
    /// Pointer-up settle delay (default: 100ms).
    pub settle_delay: Duration,
    /// Hint distance as a fraction of the drag threshold (default: 0.5).
    pub hint_ratio: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            hold_delay: HOLD_DELAY,
            settle_delay: SETTLE_DELAY,
            hint_ratio: HINT_RATIO,
        }
    }
}

/// Which gesture opens a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureMode {
    /// Drag the link past the threshold.
    Drag,
    /// Press and hold the link.
    Hold,
}

impl GestureMode {
    /// Label shown on the mode toggle.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Drag => "Drag",
            Self::Hold => "Click",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Drag => Self::Hold,
            Self::Hold => Self::Drag,
        }
    }
}

bitflags! {
    /// Pressed pointer buttons, in DOM `MouseEvent.buttons` bit order.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PointerButtons: u16 {
        const PRIMARY   = 0b0_0001;
        const SECONDARY = 0b0_0010;
        const AUXILIARY = 0b0_0100;
        const BACK      = 0b0_1000;
        const FORWARD   = 0b1_0000;
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// The link-like element under a pointer-down, as resolved by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTarget {
    /// Resolved `href` of an anchor.
    pub href: Option<String>,
    /// `data-href` attribute fallback.
    pub data_href: Option<String>,
}

impl LinkTarget {
    #[must_use]
    pub fn anchor(href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            data_href: None,
        }
    }

    #[must_use]
    pub fn data(data_href: impl Into<String>) -> Self {
        Self {
            href: None,
            data_href: Some(data_href.into()),
        }
    }

    /// The URL a preview would load, if the element is navigable.
    ///
    /// `href` wins over `data-href`. Blank values and `javascript:` URLs are
    /// not navigable.
    #[must_use]
    pub fn navigable_url(&self) -> Option<&str> {
        [self.href.as_deref(), self.data_href.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| !url.is_empty() && !is_script_url(url))
    }
}

fn is_script_url(url: &str) -> bool {
    url.get(..11)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
}

/// A pointer-down anywhere in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerDown {
    pub pos: Point,
    pub buttons: PointerButtons,
    /// Nearest link-like ancestor of the event target.
    pub link: Option<LinkTarget>,
    /// The event target lies inside the preview window.
    pub inside_preview: bool,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Identity of one gesture session. The host binds it to the link element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// What a host timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Hold-mode delay.
    Hold,
    /// Post pointer-up settle delay.
    Settle,
    /// Copy button feedback reset.
    CopyFeedback,
}

/// Handle for a host-owned timer. The generation ties it to the session or
/// window that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub kind: TimerKind,
    pub generation: u64,
}

impl TimerToken {
    #[must_use]
    pub const fn new(kind: TimerKind, generation: u64) -> Self {
        Self { kind, generation }
    }
}

/// Instruction for the host, applied in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEffect {
    /// Cancel the default action of the event being dispatched.
    PreventDefault,
    /// Associate the session with the link element under the pointer.
    BindLink(SessionId),
    /// Toggle text-selection prevention on the link and its ancestors.
    SelectionLock { session: SessionId, locked: bool },
    /// Toggle the "about to preview" hint on the link.
    DragHint { session: SessionId, visible: bool },
    StartTimer { token: TimerToken, delay: Duration },
    CancelTimer { token: TimerToken },
    /// Open a preview of `url` at `pos`.
    RequestPreview { url: String, pos: Point },
    /// Forget the link element bound to the session.
    ReleaseLink(SessionId),
}

/// Verdict for a native click on a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickDecision {
    PassThrough,
    /// Cancel the click and stop its propagation.
    Suppress,
}

/// Coarse phase of the live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    /// Pointer down, watching for threshold or hold.
    Tracking,
    /// Preview requested, pointer still down.
    Armed,
    /// Pointer released, waiting for the settle timer.
    Settling,
}

/// Terminal outcome of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// No preview; the click behaves normally.
    PassThrough,
    /// A preview was opened; the native click is suppressed once.
    PreviewProduced,
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Session {
    id: SessionId,
    url: String,
    start: Point,
    mode: GestureMode,
    threshold: f64,
    phase: GesturePhase,
    hold_pending: bool,
    hint_shown: bool,
    preview_created: bool,
    click_suppressed: bool,
}

impl Session {
    fn timer(&self, kind: TimerKind) -> TimerToken {
        TimerToken::new(kind, self.id.0)
    }

    fn outcome(&self) -> GestureOutcome {
        if self.preview_created {
            GestureOutcome::PreviewProduced
        } else {
            GestureOutcome::PassThrough
        }
    }
}

// ---------------------------------------------------------------------------
// GestureClassifier
// ---------------------------------------------------------------------------

/// Per-document link gesture state machine.
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    config: GestureConfig,
    session: Option<Session>,
    next_session: u64,
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureClassifier {
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            session: None,
            next_session: 1,
        }
    }

    /// Start a session if the press landed on a navigable link.
    ///
    /// `mode` and `threshold` are sampled once per session, so toggling the
    /// mode mid-gesture does not affect the press in progress.
    pub fn on_pointer_down(
        &mut self,
        down: &PointerDown,
        mode: GestureMode,
        threshold: f64,
    ) -> Vec<GestureEffect> {
        if down.inside_preview {
            trace!(target: "linkpeek::gesture", "pointer-down inside preview ignored");
            return Vec::new();
        }
        if !down.buttons.contains(PointerButtons::PRIMARY) {
            return Vec::new();
        }
        let Some(url) = down.link.as_ref().and_then(LinkTarget::navigable_url) else {
            return Vec::new();
        };
        let url = url.to_owned();

        let mut out = self.teardown();
        let id = SessionId(self.next_session);
        self.next_session += 1;

        let mut session = Session {
            id,
            url,
            start: down.pos,
            mode,
            threshold,
            phase: GesturePhase::Tracking,
            hold_pending: false,
            hint_shown: false,
            preview_created: false,
            click_suppressed: false,
        };

        out.push(GestureEffect::BindLink(id));
        match mode {
            GestureMode::Drag => {
                out.push(GestureEffect::SelectionLock {
                    session: id,
                    locked: true,
                });
            }
            GestureMode::Hold => {
                out.push(GestureEffect::PreventDefault);
                session.hold_pending = true;
                out.push(GestureEffect::StartTimer {
                    token: session.timer(TimerKind::Hold),
                    delay: self.config.hold_delay,
                });
            }
        }
        debug!(
            target: "linkpeek::gesture",
            session = id.0,
            ?mode,
            x = down.pos.x,
            y = down.pos.y,
            "gesture session started"
        );
        self.session = Some(session);
        out
    }

    /// Track movement of a drag-mode press.
    pub fn on_pointer_move(&mut self, pos: Point) -> Vec<GestureEffect> {
        let mut out = Vec::new();
        let Some(session) = self.session.as_mut() else {
            return out;
        };
        if session.mode != GestureMode::Drag || session.phase != GesturePhase::Tracking {
            return out;
        }

        let distance = session.start.distance_to(pos);
        if distance > session.threshold * self.config.hint_ratio && !session.hint_shown {
            session.hint_shown = true;
            out.push(GestureEffect::DragHint {
                session: session.id,
                visible: true,
            });
        }
        if distance > session.threshold {
            session.phase = GesturePhase::Armed;
            session.preview_created = true;
            if session.hint_shown {
                session.hint_shown = false;
                out.push(GestureEffect::DragHint {
                    session: session.id,
                    visible: false,
                });
            }
            debug!(
                target: "linkpeek::gesture",
                session = session.id.0,
                distance,
                "drag threshold crossed"
            );
            out.push(GestureEffect::RequestPreview {
                url: session.url.clone(),
                pos,
            });
        }
        out
    }

    /// Finish the press. Processed once per session.
    pub fn on_pointer_up(&mut self) -> Vec<GestureEffect> {
        let mut out = Vec::new();
        let Some(session) = self.session.as_mut() else {
            return out;
        };
        if session.phase == GesturePhase::Settling {
            return out;
        }

        if session.hold_pending {
            session.hold_pending = false;
            out.push(GestureEffect::CancelTimer {
                token: session.timer(TimerKind::Hold),
            });
        }
        if session.preview_created {
            session.click_suppressed = true;
            out.push(GestureEffect::PreventDefault);
        }
        if session.hint_shown {
            session.hint_shown = false;
            out.push(GestureEffect::DragHint {
                session: session.id,
                visible: false,
            });
        }
        session.phase = GesturePhase::Settling;
        out.push(GestureEffect::StartTimer {
            token: session.timer(TimerKind::Settle),
            delay: self.config.settle_delay,
        });
        debug!(
            target: "linkpeek::gesture",
            session = session.id.0,
            outcome = ?session.outcome(),
            "pointer released"
        );
        out
    }

    /// Handle an elapsed hold or settle timer.
    pub fn on_timer(&mut self, token: TimerToken) -> Vec<GestureEffect> {
        let live = self
            .session
            .as_ref()
            .is_some_and(|session| session.id.0 == token.generation);
        if !live {
            trace!(target: "linkpeek::gesture", ?token, "stale gesture timer ignored");
            return Vec::new();
        }
        match token.kind {
            TimerKind::Hold => self.on_hold_elapsed(),
            TimerKind::Settle => self.on_settle_elapsed(),
            TimerKind::CopyFeedback => Vec::new(),
        }
    }

    /// Decide the fate of a native click. `on_session_link` is whether the
    /// click landed on the element bound to the live session.
    pub fn on_click(&mut self, on_session_link: bool) -> ClickDecision {
        match self.session.as_mut() {
            Some(session) if on_session_link && session.click_suppressed => {
                session.click_suppressed = false;
                debug!(target: "linkpeek::gesture", session = session.id.0, "native click suppressed");
                ClickDecision::Suppress
            }
            _ => ClickDecision::PassThrough,
        }
    }

    /// Drop the live session, returning the effects that undo its side
    /// effects on the page.
    pub fn reset(&mut self) -> Vec<GestureEffect> {
        self.teardown()
    }

    /// Phase of the live session, `None` when idle.
    #[must_use]
    pub fn phase(&self) -> Option<GesturePhase> {
        self.session.as_ref().map(|session| session.phase)
    }

    /// Whether a session is live.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|session| session.id)
    }

    /// Outcome of the live session so far.
    #[must_use]
    pub fn outcome(&self) -> Option<GestureOutcome> {
        self.session.as_ref().map(Session::outcome)
    }
}

// ---------------------------------------------------------------------------
// Internal handlers
// ---------------------------------------------------------------------------

impl GestureClassifier {
    fn on_hold_elapsed(&mut self) -> Vec<GestureEffect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if !session.hold_pending || session.phase != GesturePhase::Tracking {
            return Vec::new();
        }
        session.hold_pending = false;
        session.phase = GesturePhase::Armed;
        session.preview_created = true;
        debug!(target: "linkpeek::gesture", session = session.id.0, "hold delay elapsed");
        vec![GestureEffect::RequestPreview {
            url: session.url.clone(),
            pos: session.start,
        }]
    }

    fn on_settle_elapsed(&mut self) -> Vec<GestureEffect> {
        match self.session.as_ref() {
            Some(session) if session.phase == GesturePhase::Settling => {}
            _ => return Vec::new(),
        }
        let Some(session) = self.session.take() else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(2);
        if session.mode == GestureMode::Drag {
            out.push(GestureEffect::SelectionLock {
                session: session.id,
                locked: false,
            });
        }
        out.push(GestureEffect::ReleaseLink(session.id));
        trace!(target: "linkpeek::gesture", session = session.id.0, "gesture session settled");
        out
    }

    fn teardown(&mut self) -> Vec<GestureEffect> {
        let Some(session) = self.session.take() else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(4);
        if session.hold_pending {
            out.push(GestureEffect::CancelTimer {
                token: session.timer(TimerKind::Hold),
            });
        }
        if session.phase == GesturePhase::Settling {
            out.push(GestureEffect::CancelTimer {
                token: session.timer(TimerKind::Settle),
            });
        }
        if session.hint_shown {
            out.push(GestureEffect::DragHint {
                session: session.id,
                visible: false,
            });
        }
        if session.mode == GestureMode::Drag {
            out.push(GestureEffect::SelectionLock {
                session: session.id,
                locked: false,
            });
        }
        out.push(GestureEffect::ReleaseLink(session.id));
        trace!(target: "linkpeek::gesture", session = session.id.0, "gesture session torn down");
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
