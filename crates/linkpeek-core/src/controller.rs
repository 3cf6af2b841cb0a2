#![forbid(unsafe_code)]

//! Preview controller: owns the gesture session, the singleton preview
//! window, and the settings record.
//!
//! Every operation returns the [`HostCommand`]s the page host must execute,
//! in order. The controller never blocks and never touches the DOM, so the
//! whole lifecycle runs natively under test.
//!
//! # Invariants
//!
//! 1. At most one [`PreviewWindow`] exists. [`PreviewController::open`]
//!    fully tears down the previous window before mounting the next.
//! 2. [`PreviewController::close`] is idempotent and always emits teardown in
//!    the same order: persist geometry, disconnect the resize observer, stop
//!    media, release content observers, cancel window timers, remove the
//!    window, reset the gesture session.
//! 3. Settings are saved after every geometry or mode change.
//! 4. Host callbacks scoped to a window carry its [`WindowId`]; callbacks
//!    for a replaced window are ignored.

use core::time::Duration;

use tracing::{debug, info, trace};

use crate::address::{self, AddressTarget, COPY_FEEDBACK_DELAY};
use crate::content::{ContentDescriptor, FrameProbe};
use crate::geometry::{Point, Size, Viewport, WindowRect};
use crate::gesture::{
    ClickDecision, GestureClassifier, GestureConfig, GestureEffect, GestureMode, PointerDown,
    SessionId, TimerKind, TimerToken,
};
use crate::settings::{self, Settings, SettingsStore};
use crate::window::{AddressLayout, PreviewWindow, WindowId, WindowView};

/// Fallback viewport until the host reports one.
const DEFAULT_VIEWPORT: Viewport = Size::new(1280.0, 800.0);

/// Instruction for the page host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    /// Cancel the default action of the event being dispatched.
    PreventDefault,
    /// Bind the session to the link element under the pointer.
    BindLink(SessionId),
    SetSelectionLock { session: SessionId, locked: bool },
    SetDragHint { session: SessionId, visible: bool },
    /// Forget the link element bound to the session.
    ReleaseLink(SessionId),
    StartTimer { token: TimerToken, delay: Duration },
    CancelTimer { token: TimerToken },
    /// Build the window DOM and register its listeners and resize observer.
    MountWindow(WindowView),
    SetWindowRect(WindowRect),
    SetAddressLayout(AddressLayout),
    SetAddressText(String),
    SetModeLabel(GestureMode),
    SetCopyFeedback(bool),
    CopyToClipboard(String),
    /// Hide any fallback notice, show the frame, point it at the descriptor
    /// and (re)attach load/error observers when the content is observed.
    LoadFrame(ContentDescriptor),
    /// Start redirecting link clicks inside the frame's document.
    ObserveFrameClicks,
    /// Hide the frame and show the fallback notice for `url`.
    ShowFallback { url: String },
    /// Open `url` in a new top-level browsing context.
    OpenInNewTab(String),
    DisconnectResizeObserver,
    /// Point the frame at the inert target.
    StopMedia,
    /// Drop load/error/inner-click observers.
    ReleaseContent,
    /// Remove the window node and drop every listener it owns.
    RemoveWindow,
}

/// Keys the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    #[must_use]
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => Self::Escape,
            _ => Self::Other,
        }
    }
}

/// Owner of all link preview state for one document.
#[derive(Debug)]
pub struct PreviewController<S> {
    settings: Settings,
    store: S,
    gesture: GestureClassifier,
    window: Option<PreviewWindow>,
    viewport: Viewport,
    next_window: u64,
}

impl<S: SettingsStore> PreviewController<S> {
    /// Load settings from `store` and start idle.
    pub fn new(store: S) -> Self {
        Self::with_config(store, GestureConfig::default())
    }

    pub fn with_config(store: S, config: GestureConfig) -> Self {
        let settings = settings::load(&store);
        debug!(target: "linkpeek::settings", ?settings, "settings loaded");
        Self {
            settings,
            store,
            gesture: GestureClassifier::new(config),
            window: None,
            viewport: DEFAULT_VIEWPORT,
            next_window: 1,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn window(&self) -> Option<&PreviewWindow> {
        self.window.as_ref()
    }

    #[must_use]
    pub const fn gesture(&self) -> &GestureClassifier {
        &self.gesture
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Record the current viewport size, used when placing new windows.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Whether a window-scoped callback still refers to the live window.
    #[must_use]
    pub fn is_current(&self, id: WindowId) -> bool {
        self.window.as_ref().is_some_and(|w| w.id() == id)
    }

    // -----------------------------------------------------------------------
    // Gesture entry points
    // -----------------------------------------------------------------------

    pub fn on_pointer_down(&mut self, down: &PointerDown) -> Vec<HostCommand> {
        let mode = self.settings.gesture_mode();
        let threshold = self.settings.drag_threshold;
        let effects = self.gesture.on_pointer_down(down, mode, threshold);
        self.apply_gesture_effects(effects)
    }

    /// Pointer movement anywhere in the document. Also drives an active
    /// header drag.
    pub fn on_pointer_move(&mut self, pos: Point) -> Vec<HostCommand> {
        let mut out = Vec::new();
        if let Some(rect) = self.window.as_mut().and_then(|w| w.drag_header_to(pos)) {
            out.push(HostCommand::SetWindowRect(rect));
        }
        let effects = self.gesture.on_pointer_move(pos);
        out.extend(self.apply_gesture_effects(effects));
        out
    }

    /// Pointer release anywhere in the document. Also ends an active header
    /// drag.
    pub fn on_pointer_up(&mut self) -> Vec<HostCommand> {
        let mut out = Vec::new();
        if self.window.as_mut().is_some_and(PreviewWindow::end_header_drag) {
            self.persist();
        }
        let effects = self.gesture.on_pointer_up();
        out.extend(self.apply_gesture_effects(effects));
        out
    }

    /// Native click on a link; see [`GestureClassifier::on_click`].
    pub fn on_click(&mut self, on_session_link: bool) -> ClickDecision {
        self.gesture.on_click(on_session_link)
    }

    pub fn on_timer(&mut self, token: TimerToken) -> Vec<HostCommand> {
        match token.kind {
            TimerKind::Hold | TimerKind::Settle => {
                let effects = self.gesture.on_timer(token);
                self.apply_gesture_effects(effects)
            }
            TimerKind::CopyFeedback => {
                let Some(window) = self.window.as_mut() else {
                    return Vec::new();
                };
                if window.id().get() != token.generation || !window.copy_feedback() {
                    return Vec::new();
                }
                window.set_copy_feedback(false);
                vec![HostCommand::SetCopyFeedback(false)]
            }
        }
    }

    pub fn on_key(&mut self, key: Key) -> Vec<HostCommand> {
        match key {
            Key::Escape if self.window.is_some() => self.close(),
            _ => Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Open a preview of `url` near `anchor`, replacing any open window.
    pub fn open(&mut self, url: &str, anchor: Point) -> Vec<HostCommand> {
        let mut out = self.teardown_window();
        let id = WindowId(self.next_window);
        self.next_window += 1;

        let window = PreviewWindow::new(
            id,
            url,
            anchor,
            self.settings.size(),
            self.settings.min_size(),
            self.viewport,
        );
        info!(
            target: "linkpeek::window",
            window = id.get(),
            url,
            x = window.rect().x,
            y = window.rect().y,
            "preview window opened"
        );
        out.push(HostCommand::MountWindow(
            window.view(self.settings.gesture_mode()),
        ));
        out.push(HostCommand::LoadFrame(window.content().clone()));
        self.window = Some(window);
        out
    }

    /// Close the window, if any, and reset the gesture session.
    pub fn close(&mut self) -> Vec<HostCommand> {
        if self.window.is_none() {
            return Vec::new();
        }
        let mut out = self.teardown_window();
        let effects = self.gesture.reset();
        out.extend(self.apply_gesture_effects(effects));
        out
    }

    /// Begin moving the window by its header.
    pub fn on_header_pointer_down(&mut self, id: WindowId, pos: Point) -> Vec<HostCommand> {
        if let Some(window) = self.current_mut(id) {
            window.begin_header_drag(pos);
            return vec![HostCommand::PreventDefault];
        }
        Vec::new()
    }

    /// The resize observer reported a new window size.
    pub fn on_resize(&mut self, id: WindowId, size: Size) -> Vec<HostCommand> {
        let min = self.settings.min_size();
        let Some(window) = self.current_mut(id) else {
            return Vec::new();
        };
        if window.rect().size() == size {
            return Vec::new();
        }
        let (clamped, layout) = window.apply_resize(size, min);
        let mut out = Vec::new();
        if let Some(rect) = clamped {
            trace!(target: "linkpeek::window", ?rect, "resize clamped to minimum");
            out.push(HostCommand::SetWindowRect(rect));
        }
        if let Some(layout) = layout {
            out.push(HostCommand::SetAddressLayout(layout));
        }
        self.persist();
        out
    }

    /// Flip between drag and click-and-hold mode.
    pub fn toggle_mode(&mut self) -> Vec<HostCommand> {
        self.settings.drag_mode_enabled = !self.settings.drag_mode_enabled;
        let mode = self.settings.gesture_mode();
        debug!(target: "linkpeek::settings", ?mode, "gesture mode toggled");
        self.persist();
        vec![HostCommand::SetModeLabel(mode)]
    }

    // -----------------------------------------------------------------------
    // Content
    // -----------------------------------------------------------------------

    /// The frame reported loaded; `probe` is the introspection result.
    pub fn on_frame_loaded(&mut self, id: WindowId, probe: FrameProbe) -> Vec<HostCommand> {
        let Some(window) = self.current_mut(id) else {
            return Vec::new();
        };
        if window.apply_probe(probe) {
            debug!(target: "linkpeek::content", window = id.get(), "frame blocked; showing fallback");
            return vec![HostCommand::ShowFallback {
                url: window.url().to_owned(),
            }];
        }
        match probe {
            FrameProbe::Accessible if !window.content().is_video() => {
                vec![HostCommand::ObserveFrameClicks]
            }
            _ => Vec::new(),
        }
    }

    /// The frame reported a load error.
    pub fn on_frame_error(&mut self, id: WindowId) -> Vec<HostCommand> {
        let Some(window) = self.current_mut(id) else {
            return Vec::new();
        };
        if window.apply_error() {
            debug!(target: "linkpeek::content", window = id.get(), "frame load error; showing fallback");
            return vec![HostCommand::ShowFallback {
                url: window.url().to_owned(),
            }];
        }
        Vec::new()
    }

    /// The fallback notice's "open in new tab" action.
    pub fn open_fallback_in_new_tab(&mut self, id: WindowId) -> Vec<HostCommand> {
        match self.current_mut(id) {
            Some(window) => vec![HostCommand::OpenInNewTab(window.url().to_owned())],
            None => Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Address bar
    // -----------------------------------------------------------------------

    /// Navigate action or Enter in the address field.
    pub fn submit_address(&mut self, id: WindowId, raw: &str) -> Vec<HostCommand> {
        match address::classify(raw) {
            Some(target) => self.navigate(id, &target),
            None => Vec::new(),
        }
    }

    /// Search button: always treat the address text as a query.
    pub fn search_address(&mut self, id: WindowId, raw: &str) -> Vec<HostCommand> {
        let query = raw.trim();
        if query.is_empty() {
            return Vec::new();
        }
        self.navigate(id, &AddressTarget::search(query))
    }

    /// Copy button: put the address text on the clipboard.
    pub fn copy_address(&mut self, id: WindowId, raw: &str) -> Vec<HostCommand> {
        let Some(window) = self.current_mut(id) else {
            return Vec::new();
        };
        let token = TimerToken::new(TimerKind::CopyFeedback, id.get());
        let mut out = Vec::with_capacity(4);
        out.push(HostCommand::CopyToClipboard(raw.to_owned()));
        if window.copy_feedback() {
            out.push(HostCommand::CancelTimer { token });
        }
        window.set_copy_feedback(true);
        out.push(HostCommand::SetCopyFeedback(true));
        out.push(HostCommand::StartTimer {
            token,
            delay: COPY_FEEDBACK_DELAY,
        });
        out
    }

    /// A link was clicked inside an accessible frame.
    pub fn on_inner_link_click(&mut self, id: WindowId, href: &str) -> Vec<HostCommand> {
        let href = href.trim();
        if href.is_empty() {
            return Vec::new();
        }
        self.navigate(id, &AddressTarget::Url(href.to_owned()))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn navigate(&mut self, id: WindowId, target: &AddressTarget) -> Vec<HostCommand> {
        let Some(window) = self.current_mut(id) else {
            return Vec::new();
        };
        let content = window.navigate(target.url()).clone();
        debug!(
            target: "linkpeek::content",
            window = id.get(),
            url = target.url(),
            search = matches!(target, AddressTarget::Search { .. }),
            "preview navigated"
        );
        vec![
            HostCommand::LoadFrame(content),
            HostCommand::SetAddressText(target.url().to_owned()),
        ]
    }

    fn current_mut(&mut self, id: WindowId) -> Option<&mut PreviewWindow> {
        self.window.as_mut().filter(|w| w.id() == id)
    }

    fn apply_gesture_effects(&mut self, effects: Vec<GestureEffect>) -> Vec<HostCommand> {
        let mut out = Vec::with_capacity(effects.len());
        for effect in effects {
            let cmd = match effect {
                GestureEffect::RequestPreview { url, pos } => {
                    out.extend(self.open(&url, pos));
                    continue;
                }
                GestureEffect::PreventDefault => HostCommand::PreventDefault,
                GestureEffect::BindLink(session) => HostCommand::BindLink(session),
                GestureEffect::SelectionLock { session, locked } => {
                    HostCommand::SetSelectionLock { session, locked }
                }
                GestureEffect::DragHint { session, visible } => {
                    HostCommand::SetDragHint { session, visible }
                }
                GestureEffect::StartTimer { token, delay } => {
                    HostCommand::StartTimer { token, delay }
                }
                GestureEffect::CancelTimer { token } => HostCommand::CancelTimer { token },
                GestureEffect::ReleaseLink(session) => HostCommand::ReleaseLink(session),
            };
            out.push(cmd);
        }
        out
    }

    /// Full window teardown. Leaves the gesture session alone so a preview
    /// produced by the live session keeps its click suppression.
    fn teardown_window(&mut self) -> Vec<HostCommand> {
        if self.window.is_none() {
            return Vec::new();
        }
        self.persist();
        let Some(window) = self.window.take() else {
            return Vec::new();
        };
        let mut out = vec![
            HostCommand::DisconnectResizeObserver,
            HostCommand::StopMedia,
            HostCommand::ReleaseContent,
        ];
        if window.copy_feedback() {
            out.push(HostCommand::CancelTimer {
                token: TimerToken::new(TimerKind::CopyFeedback, window.id().get()),
            });
        }
        out.push(HostCommand::RemoveWindow);
        info!(target: "linkpeek::window", window = window.id().get(), "preview window closed");
        out
    }

    /// Fold the window geometry into the settings and save them.
    fn persist(&mut self) {
        if let Some(window) = &self.window {
            let rect = window.rect();
            self.settings.width = rect.width;
            self.settings.height = rect.height;
        }
        if let Err(err) = settings::save(&mut self.store, &self.settings) {
            debug!(target: "linkpeek::settings", error = %err, "settings save failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentKind;
    use crate::gesture::{LinkTarget, PointerButtons};
    use crate::settings::MemoryStore;
    use pretty_assertions::assert_eq;

    fn controller() -> PreviewController<MemoryStore> {
        let mut c = PreviewController::new(MemoryStore::new());
        c.set_viewport(Size::new(1024.0, 768.0));
        c
    }

    fn down(url: &str, x: f64, y: f64) -> PointerDown {
        PointerDown {
            pos: Point::new(x, y),
            buttons: PointerButtons::PRIMARY,
            link: Some(LinkTarget::anchor(url)),
            inside_preview: false,
        }
    }

    fn window_id(c: &PreviewController<MemoryStore>) -> WindowId {
        c.window().unwrap().id()
    }

    #[test]
    fn open_mounts_then_loads() {
        let mut c = controller();
        let cmds = c.open("https://example.com/", Point::new(10.0, 10.0));
        assert_eq!(cmds.len(), 2);
        let HostCommand::MountWindow(view) = &cmds[0] else {
            panic!("expected mount, got {:?}", cmds[0]);
        };
        assert_eq!(view.rect, WindowRect::new(10.0, 10.0, 500.0, 400.0));
        assert_eq!(view.mode, GestureMode::Drag);
        assert!(matches!(cmds[1], HostCommand::LoadFrame(_)));
    }

    #[test]
    fn close_teardown_order() {
        let mut c = controller();
        c.open("https://example.com/", Point::new(0.0, 0.0));
        let cmds = c.close();
        assert_eq!(
            cmds,
            vec![
                HostCommand::DisconnectResizeObserver,
                HostCommand::StopMedia,
                HostCommand::ReleaseContent,
                HostCommand::RemoveWindow,
            ]
        );
        assert!(c.window().is_none());
        assert!(c.store().writes() >= 1);
        assert!(c.close().is_empty());
    }

    #[test]
    fn escape_closes_only_open_window() {
        let mut c = controller();
        assert!(c.on_key(Key::Escape).is_empty());
        c.open("https://example.com/", Point::new(0.0, 0.0));
        assert!(c.on_key(Key::Other).is_empty());
        assert!(c.on_key(Key::Escape).contains(&HostCommand::RemoveWindow));
        assert!(c.window().is_none());
    }

    #[test]
    fn key_mapping() {
        assert_eq!(Key::from_dom("Escape"), Key::Escape);
        assert_eq!(Key::from_dom("Enter"), Key::Other);
    }

    #[test]
    fn drag_gesture_opens_preview_at_crossing_point() {
        let mut c = controller();
        c.on_pointer_down(&down("https://example.com/", 100.0, 100.0));
        let cmds = c.on_pointer_move(Point::new(140.0, 100.0));
        let mount = cmds
            .iter()
            .find_map(|cmd| match cmd {
                HostCommand::MountWindow(view) => Some(view.rect.origin()),
                _ => None,
            })
            .unwrap();
        assert_eq!(mount, Point::new(140.0, 100.0));
        assert!(c.on_pointer_up().contains(&HostCommand::PreventDefault));
        assert_eq!(c.on_click(true), ClickDecision::Suppress);
        assert_eq!(c.on_click(true), ClickDecision::PassThrough);
    }

    #[test]
    fn gesture_replacing_window_keeps_click_suppression() {
        let mut c = controller();
        c.open("https://first.test/", Point::new(0.0, 0.0));
        let first = window_id(&c);
        c.on_pointer_down(&down("https://second.test/", 100.0, 100.0));
        let cmds = c.on_pointer_move(Point::new(200.0, 100.0));
        assert!(cmds.contains(&HostCommand::RemoveWindow));
        assert_ne!(window_id(&c), first);
        c.on_pointer_up();
        assert_eq!(c.on_click(true), ClickDecision::Suppress);
    }

    #[test]
    fn close_resets_gesture_session() {
        let mut c = controller();
        c.settings.drag_mode_enabled = false;
        c.on_pointer_down(&down("https://example.com/", 5.0, 5.0));
        let session = c.gesture().session_id().unwrap();
        c.on_timer(TimerToken::new(TimerKind::Hold, session.get()));
        assert!(c.window().is_some());
        let cmds = c.close();
        assert_eq!(cmds.last(), Some(&HostCommand::ReleaseLink(session)));
        assert!(!c.gesture().is_active());
    }

    #[test]
    fn hold_preview_opens_at_down_position() {
        let mut c = controller();
        c.settings.drag_mode_enabled = false;
        let cmds = c.on_pointer_down(&down("https://example.com/", 30.0, 40.0));
        assert_eq!(cmds[1], HostCommand::PreventDefault);
        let session = c.gesture().session_id().unwrap();
        let cmds = c.on_timer(TimerToken::new(TimerKind::Hold, session.get()));
        assert!(matches!(cmds[0], HostCommand::MountWindow(_)));
        assert_eq!(c.window().unwrap().rect().origin(), Point::new(30.0, 40.0));
    }

    #[test]
    fn resize_clamps_relayouts_and_saves() {
        let mut c = controller();
        c.open("https://example.com/", Point::new(0.0, 0.0));
        let id = window_id(&c);
        let writes = c.store().writes();
        let cmds = c.on_resize(id, Size::new(200.0, 100.0));
        assert_eq!(
            cmds,
            vec![
                HostCommand::SetWindowRect(WindowRect::new(0.0, 0.0, 300.0, 200.0)),
                HostCommand::SetAddressLayout(AddressLayout::Narrow),
            ]
        );
        assert_eq!(c.store().writes(), writes + 1);
        assert_eq!(c.settings().width, 300.0);
    }

    #[test]
    fn resize_for_replaced_window_is_ignored() {
        let mut c = controller();
        c.open("https://a.test/", Point::new(0.0, 0.0));
        let old = window_id(&c);
        c.open("https://b.test/", Point::new(0.0, 0.0));
        assert!(c.on_resize(old, Size::new(100.0, 100.0)).is_empty());
        assert!(!c.is_current(old));
    }

    #[test]
    fn header_drag_moves_and_persists_on_release() {
        let mut c = controller();
        c.open("https://example.com/", Point::new(10.0, 10.0));
        let id = window_id(&c);
        c.on_header_pointer_down(id, Point::new(20.0, 20.0));
        let cmds = c.on_pointer_move(Point::new(50.0, 60.0));
        assert_eq!(
            cmds,
            vec![HostCommand::SetWindowRect(WindowRect::new(
                40.0, 50.0, 500.0, 400.0
            ))]
        );
        let writes = c.store().writes();
        c.on_pointer_up();
        assert_eq!(c.store().writes(), writes + 1);
        assert!(c.on_pointer_move(Point::new(0.0, 0.0)).is_empty());
    }

    #[test]
    fn toggle_mode_saves_and_relabels() {
        let mut c = controller();
        assert_eq!(
            c.toggle_mode(),
            vec![HostCommand::SetModeLabel(GestureMode::Hold)]
        );
        assert!(!c.settings().drag_mode_enabled);
        let saved = Settings::from_json(c.store().raw().unwrap()).unwrap();
        assert!(!saved.drag_mode_enabled);
    }

    #[test]
    fn blocked_frame_shows_fallback_once() {
        let mut c = controller();
        c.open("https://example.com/", Point::new(0.0, 0.0));
        let id = window_id(&c);
        assert_eq!(
            c.on_frame_loaded(id, FrameProbe::Blocked),
            vec![HostCommand::ShowFallback {
                url: "https://example.com/".into()
            }]
        );
        assert!(c.on_frame_error(id).is_empty());
        assert_eq!(
            c.open_fallback_in_new_tab(id),
            vec![HostCommand::OpenInNewTab("https://example.com/".into())]
        );
    }

    #[test]
    fn accessible_frame_observes_clicks() {
        let mut c = controller();
        c.open("https://example.com/", Point::new(0.0, 0.0));
        let id = window_id(&c);
        assert_eq!(
            c.on_frame_loaded(id, FrameProbe::Accessible),
            vec![HostCommand::ObserveFrameClicks]
        );
    }

    #[test]
    fn submit_bare_host_navigates_with_scheme() {
        let mut c = controller();
        c.open("https://example.org/", Point::new(0.0, 0.0));
        let id = window_id(&c);
        let cmds = c.submit_address(id, "example.com");
        assert_eq!(
            cmds[1],
            HostCommand::SetAddressText("https://example.com".into())
        );
        let HostCommand::LoadFrame(content) = &cmds[0] else {
            panic!("expected load, got {:?}", cmds[0]);
        };
        assert_eq!(content.src, "https://example.com");
        assert!(c.submit_address(id, "   ").is_empty());
    }

    #[test]
    fn search_button_always_searches() {
        let mut c = controller();
        c.open("https://example.org/", Point::new(0.0, 0.0));
        let id = window_id(&c);
        let cmds = c.search_address(id, "example.com");
        assert_eq!(
            cmds[1],
            HostCommand::SetAddressText("https://www.google.com/search?q=example.com".into())
        );
    }

    #[test]
    fn inner_link_click_mirrors_address() {
        let mut c = controller();
        c.open("https://example.org/", Point::new(0.0, 0.0));
        let id = window_id(&c);
        c.on_frame_loaded(id, FrameProbe::Accessible);
        let cmds = c.on_inner_link_click(id, "https://example.org/next");
        assert_eq!(
            cmds[1],
            HostCommand::SetAddressText("https://example.org/next".into())
        );
        assert_eq!(c.window().unwrap().url(), "https://example.org/next");
    }

    #[test]
    fn navigate_to_video_switches_content_kind() {
        let mut c = controller();
        c.open("https://example.org/", Point::new(0.0, 0.0));
        let id = window_id(&c);
        let cmds = c.submit_address(id, "https://youtu.be/abc123");
        let HostCommand::LoadFrame(content) = &cmds[0] else {
            panic!("expected load");
        };
        assert_eq!(
            content.kind,
            ContentKind::Video {
                id: "abc123".into()
            }
        );
    }

    #[test]
    fn copy_feedback_reverts_on_timer() {
        let mut c = controller();
        c.open("https://example.org/", Point::new(0.0, 0.0));
        let id = window_id(&c);
        let cmds = c.copy_address(id, "https://example.org/");
        assert_eq!(
            cmds[0],
            HostCommand::CopyToClipboard("https://example.org/".into())
        );
        let token = TimerToken::new(TimerKind::CopyFeedback, id.get());
        assert_eq!(
            c.on_timer(token),
            vec![HostCommand::SetCopyFeedback(false)]
        );
        assert!(c.on_timer(token).is_empty());
    }

    #[test]
    fn close_cancels_pending_copy_feedback() {
        let mut c = controller();
        c.open("https://example.org/", Point::new(0.0, 0.0));
        let id = window_id(&c);
        c.copy_address(id, "x");
        let cmds = c.close();
        assert!(cmds.contains(&HostCommand::CancelTimer {
            token: TimerToken::new(TimerKind::CopyFeedback, id.get())
        }));
    }

    #[test]
    fn pointer_down_inside_preview_is_ignored() {
        let mut c = controller();
        c.open("https://example.org/", Point::new(0.0, 0.0));
        let mut d = down("https://example.com/", 10.0, 10.0);
        d.inside_preview = true;
        assert!(c.on_pointer_down(&d).is_empty());
    }
}
