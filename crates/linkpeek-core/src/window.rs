#![forbid(unsafe_code)]

//! The preview window record.
//!
//! Plain data owned by the controller. The host keeps the matching DOM
//! nodes; nothing here refers to them.

use crate::content::{self, ContentDescriptor, ContentState, FrameProbe};
use crate::geometry::{Point, Size, Viewport, WindowRect};
use crate::gesture::GestureMode;

/// Widths at or above this show the full address bar.
pub const REGULAR_MIN_WIDTH: f64 = 500.0;
/// Widths at or above this (and below [`REGULAR_MIN_WIDTH`]) are compact.
pub const COMPACT_MIN_WIDTH: f64 = 400.0;

/// Identity of one preview window instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub(crate) u64);

impl WindowId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Responsive arrangement of the title bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressLayout {
    /// Title, address field, copy/search buttons, mode toggle, close.
    Regular,
    /// Title hidden.
    Compact,
    /// Title and copy/search buttons hidden.
    Narrow,
}

impl AddressLayout {
    #[must_use]
    pub fn for_width(width: f64) -> Self {
        if width >= REGULAR_MIN_WIDTH {
            Self::Regular
        } else if width >= COMPACT_MIN_WIDTH {
            Self::Compact
        } else {
            Self::Narrow
        }
    }

    #[must_use]
    pub const fn shows_title(self) -> bool {
        matches!(self, Self::Regular)
    }

    #[must_use]
    pub const fn shows_tools(self) -> bool {
        !matches!(self, Self::Narrow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HeaderDrag {
    pointer_start: Point,
    origin: Point,
}

/// Everything the host needs to build the window's DOM.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowView {
    pub id: WindowId,
    pub rect: WindowRect,
    pub address_text: String,
    pub layout: AddressLayout,
    pub mode: GestureMode,
    pub content: ContentDescriptor,
}

/// Singleton preview window state.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewWindow {
    id: WindowId,
    rect: WindowRect,
    address_text: String,
    layout: AddressLayout,
    content: ContentDescriptor,
    state: ContentState,
    header_drag: Option<HeaderDrag>,
    copy_feedback: bool,
}

impl PreviewWindow {
    /// A window showing `url`, anchored at `anchor` and kept inside
    /// `viewport`.
    #[must_use]
    pub fn new(
        id: WindowId,
        url: &str,
        anchor: Point,
        size: Size,
        min: Size,
        viewport: Viewport,
    ) -> Self {
        let rect = WindowRect::placed(anchor, size, min, viewport);
        let content = content::load(url);
        Self {
            id,
            rect,
            address_text: url.to_owned(),
            layout: AddressLayout::for_width(rect.width),
            state: ContentState::initial(&content),
            content,
            header_drag: None,
            copy_feedback: false,
        }
    }

    #[must_use]
    pub fn view(&self, mode: GestureMode) -> WindowView {
        WindowView {
            id: self.id,
            rect: self.rect,
            address_text: self.address_text.clone(),
            layout: self.layout,
            mode,
            content: self.content.clone(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> WindowId {
        self.id
    }

    #[must_use]
    pub const fn rect(&self) -> WindowRect {
        self.rect
    }

    /// URL the frame currently targets.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.content.target
    }

    #[must_use]
    pub fn address_text(&self) -> &str {
        &self.address_text
    }

    #[must_use]
    pub const fn layout(&self) -> AddressLayout {
        self.layout
    }

    #[must_use]
    pub const fn content(&self) -> &ContentDescriptor {
        &self.content
    }

    #[must_use]
    pub const fn content_state(&self) -> ContentState {
        self.state
    }

    #[must_use]
    pub const fn copy_feedback(&self) -> bool {
        self.copy_feedback
    }

    #[must_use]
    pub const fn is_header_dragging(&self) -> bool {
        self.header_drag.is_some()
    }

    /// Point the frame at a new target. Returns the new descriptor.
    pub fn navigate(&mut self, url: &str) -> &ContentDescriptor {
        self.content = content::load(url);
        self.state = ContentState::initial(&self.content);
        self.address_text = url.to_owned();
        &self.content
    }

    /// Apply a frame probe. Returns `true` when the window switched to the
    /// fallback notice.
    pub fn apply_probe(&mut self, probe: FrameProbe) -> bool {
        let before = self.state;
        self.state = before.on_loaded(probe);
        before != ContentState::Fallback && self.state == ContentState::Fallback
    }

    /// Apply a frame load error. Returns `true` when the window switched to
    /// the fallback notice.
    pub fn apply_error(&mut self) -> bool {
        let before = self.state;
        self.state = before.on_error();
        before != ContentState::Fallback && self.state == ContentState::Fallback
    }

    /// Record an observed size. Returns the rect if it had to be raised to
    /// the minimum, and the new layout if the breakpoint changed.
    pub fn apply_resize(
        &mut self,
        size: Size,
        min: Size,
    ) -> (Option<WindowRect>, Option<AddressLayout>) {
        self.rect.width = size.width;
        self.rect.height = size.height;
        let clamped = self.rect.enforce_min(min).then_some(self.rect);
        let layout = AddressLayout::for_width(self.rect.width);
        let relayout = (layout != self.layout).then_some(layout);
        self.layout = layout;
        (clamped, relayout)
    }

    pub fn begin_header_drag(&mut self, pointer: Point) {
        self.header_drag = Some(HeaderDrag {
            pointer_start: pointer,
            origin: self.rect.origin(),
        });
    }

    /// Move with the pointer. `None` when no header drag is active.
    pub fn drag_header_to(&mut self, pointer: Point) -> Option<WindowRect> {
        let drag = self.header_drag?;
        self.rect.x = drag.origin.x + pointer.x - drag.pointer_start.x;
        self.rect.y = drag.origin.y + pointer.y - drag.pointer_start.y;
        Some(self.rect)
    }

    /// Returns `true` if a header drag was active.
    pub fn end_header_drag(&mut self) -> bool {
        self.header_drag.take().is_some()
    }

    pub fn set_copy_feedback(&mut self, on: bool) {
        self.copy_feedback = on;
    }
}
