#![forbid(unsafe_code)]

//! Platform-independent host bookkeeping.
//!
//! The wasm host keeps browser handles (timeout ids, link elements) keyed by
//! the identities the controller hands out. The registries are generic over
//! the handle type so their behavior is tested natively.

use std::collections::HashMap;

use linkpeek_core::{AddressLayout, SessionId, TimerToken, WindowRect};

/// Class applied to the preview window's root node.
pub const WINDOW_CLASS: &str = "linkpeek-window";
/// Class on a link whose drag is about to open a preview.
pub const DRAG_HINT_CLASS: &str = "linkpeek-drag-hint";
/// Class that disables text selection during a drag.
pub const NO_SELECT_CLASS: &str = "linkpeek-no-select";
/// Id of the injected stylesheet.
pub const STYLE_ID: &str = "linkpeek-style";
/// Selector for elements that can start a gesture.
pub const LINK_SELECTOR: &str = "a[href], [data-href]";

/// Stylesheet injected once per document.
pub const STYLESHEET: &str = "\
.linkpeek-window{position:fixed;z-index:2147483646;box-sizing:border-box;display:flex;\
flex-direction:column;overflow:hidden;resize:both;background:#fff;border:1px solid #bbb;\
border-radius:6px;box-shadow:0 8px 28px rgba(0,0,0,.28);font:13px/1.4 system-ui,sans-serif;color:#222}\
.linkpeek-header{display:flex;align-items:center;gap:4px;padding:4px 6px;cursor:move;\
background:#f3f3f3;border-bottom:1px solid #ddd;user-select:none}\
.linkpeek-title{font-weight:600;white-space:nowrap}\
.linkpeek-address{flex:1;min-width:0;padding:2px 6px;font:inherit;cursor:text}\
.linkpeek-header button{font:inherit;cursor:pointer;padding:2px 6px}\
.linkpeek-body{position:relative;flex:1}\
.linkpeek-frame{position:absolute;inset:0;width:100%;height:100%;border:0}\
.linkpeek-fallback{position:absolute;inset:0;display:flex;flex-direction:column;\
align-items:center;justify-content:center;gap:8px;padding:16px;text-align:center}\
.linkpeek-hidden{display:none!important}\
.linkpeek-layout-compact .linkpeek-title{display:none}\
.linkpeek-layout-narrow .linkpeek-title,.linkpeek-layout-narrow .linkpeek-tool{display:none}\
.linkpeek-drag-hint{outline:2px dashed #3b82f6;outline-offset:2px}\
.linkpeek-no-select{user-select:none!important;-webkit-user-select:none!important}\
@media (prefers-color-scheme:dark){.linkpeek-window{background:#222;color:#eee;border-color:#444}\
.linkpeek-header{background:#2c2c2c;border-color:#444}\
.linkpeek-window input,.linkpeek-window button{background:rgba(70,70,70,.8);color:#fff;\
border:1px solid rgba(255,255,255,.2)}.linkpeek-fallback{background:rgba(40,40,40,.9)}}";

/// Fallback notice text.
pub const FALLBACK_MESSAGE: &str = "This page cannot be displayed in the preview.";
/// Fallback notice action label.
pub const FALLBACK_ACTION: &str = "Open in New Tab";
/// Title shown in the regular layout.
pub const WINDOW_TITLE: &str = "Link Preview";

/// Errors from host-side DOM and timer operations.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("browser global unavailable: {0}")]
    MissingGlobal(&'static str),
    #[error("DOM operation `{op}` failed: {detail}")]
    Dom { op: &'static str, detail: String },
    #[error("failed to schedule timer {token:?}: {detail}")]
    Timer { token: TimerToken, detail: String },
}

/// CSS length in pixels.
#[must_use]
pub fn px(value: f64) -> String {
    format!("{}px", value.round())
}

/// `left`, `top`, `width`, `height` style values for a rect.
#[must_use]
pub fn rect_style(rect: WindowRect) -> [(&'static str, String); 4] {
    [
        ("left", px(rect.x)),
        ("top", px(rect.y)),
        ("width", px(rect.width)),
        ("height", px(rect.height)),
    ]
}

/// Layout class toggled on the window root, `None` for the regular layout.
#[must_use]
pub const fn layout_class(layout: AddressLayout) -> Option<&'static str> {
    match layout {
        AddressLayout::Regular => None,
        AddressLayout::Compact => Some("linkpeek-layout-compact"),
        AddressLayout::Narrow => Some("linkpeek-layout-narrow"),
    }
}

/// Every layout class, for clearing before applying a new one.
pub const LAYOUT_CLASSES: [&str; 2] = ["linkpeek-layout-compact", "linkpeek-layout-narrow"];

/// Copy button label.
#[must_use]
pub const fn copy_label(feedback: bool) -> &'static str {
    if feedback { "\u{2713}" } else { "\u{1f4cb}" }
}

// ---------------------------------------------------------------------------
// TimerRegistry
// ---------------------------------------------------------------------------

/// Pending host timers keyed by token.
#[derive(Debug)]
pub struct TimerRegistry<H> {
    pending: HashMap<TimerToken, H>,
}

impl<H> Default for TimerRegistry<H> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }
}

impl<H> TimerRegistry<H> {
    /// Track a scheduled timer. Returns the handle it replaced, which the
    /// caller must cancel.
    pub fn insert(&mut self, token: TimerToken, handle: H) -> Option<H> {
        self.pending.insert(token, handle)
    }

    /// Stop tracking `token`, returning its handle.
    pub fn take(&mut self, token: TimerToken) -> Option<H> {
        self.pending.remove(&token)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// ---------------------------------------------------------------------------
// LinkRegistry
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct BoundLink<E> {
    link: E,
    locked: Vec<E>,
}

/// Link elements bound to gesture sessions, plus the ancestors whose text
/// selection each session locked.
#[derive(Debug)]
pub struct LinkRegistry<E> {
    bound: HashMap<SessionId, BoundLink<E>>,
}

impl<E> Default for LinkRegistry<E> {
    fn default() -> Self {
        Self {
            bound: HashMap::new(),
        }
    }
}

impl<E> LinkRegistry<E> {
    pub fn bind(&mut self, session: SessionId, link: E) {
        self.bound.insert(
            session,
            BoundLink {
                link,
                locked: Vec::new(),
            },
        );
    }

    #[must_use]
    pub fn link(&self, session: SessionId) -> Option<&E> {
        self.bound.get(&session).map(|bound| &bound.link)
    }

    /// Record the elements a selection lock touched.
    pub fn set_locked(&mut self, session: SessionId, locked: Vec<E>) {
        if let Some(bound) = self.bound.get_mut(&session) {
            bound.locked = locked;
        }
    }

    /// Hand back the locked elements so the caller can unlock them.
    pub fn take_locked(&mut self, session: SessionId) -> Vec<E> {
        self.bound
            .get_mut(&session)
            .map(|bound| std::mem::take(&mut bound.locked))
            .unwrap_or_default()
    }

    /// Forget the session. Returns any elements still locked.
    pub fn release(&mut self, session: SessionId) -> Vec<E> {
        self.bound
            .remove(&session)
            .map(|bound| bound.locked)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bound.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}
