#![forbid(unsafe_code)]

//! `wasm-bindgen` entry point and command executor.
//!
//! The host owns the [`PreviewController`] in a thread-local cell. DOM
//! listeners translate events into controller calls and execute the returned
//! [`HostCommand`]s in order. Only compiled on `wasm32` targets.

use std::cell::RefCell;
use std::time::Duration;

use js_sys::{Function, Reflect};
use linkpeek_core::{
    ClickDecision, HostCommand, Key, PointerButtons, PointerDown, PreviewController, Size,
    TimerToken, WindowId,
};
use tracing::{debug, trace, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, HtmlDocument, KeyboardEvent, MouseEvent, Node, Window};

use crate::dom::{
    Listener, WindowAction, WindowDom, async_clipboard, client_pos, dom_err, install_stylesheet,
    link_target, write_clipboard,
};
use crate::host_core::{
    DRAG_HINT_CLASS, HostError, LINK_SELECTOR, LinkRegistry, NO_SELECT_CLASS, TimerRegistry,
};
use crate::storage::LocalStorageStore;

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "linkpeek panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("linkpeek panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

/// A scheduled `setTimeout` and the callback it will invoke.
struct PendingTimer {
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

struct Host {
    controller: PreviewController<LocalStorageStore>,
    window: Window,
    document: Document,
    dom: Option<WindowDom>,
    timers: TimerRegistry<PendingTimer>,
    links: LinkRegistry<Element>,
    /// Link element under the pointer-down being dispatched.
    pending_link: Option<Element>,
    /// Rejection handler for clipboard writes.
    clipboard_rejected: Closure<dyn FnMut(JsValue)>,
    _listeners: Vec<Listener>,
}

thread_local! {
    static HOST: RefCell<Option<Host>> = const { RefCell::new(None) };
}

/// Install the link preview on the current document.
#[wasm_bindgen(start)]
pub fn start() {
    install_panic_hook();
    if let Err(err) = boot() {
        console_error(&format!("linkpeek: {err}"));
    }
}

fn boot() -> Result<(), HostError> {
    let window = web_sys::window().ok_or(HostError::MissingGlobal("window"))?;
    let document = window
        .document()
        .ok_or(HostError::MissingGlobal("document"))?;
    install_stylesheet(&document)?;

    let store = LocalStorageStore::new();
    if !store.is_available() {
        debug!(target: "linkpeek::web", "localStorage unavailable; settings will not persist");
    }
    let mut controller = PreviewController::new(store);
    if let Some(viewport) = viewport_of(&window) {
        controller.set_viewport(viewport);
    }

    let listeners = vec![
        Listener::attach(document.as_ref(), "mousedown", true, on_mouse_down)?,
        Listener::attach(document.as_ref(), "mousemove", false, on_mouse_move)?,
        Listener::attach(document.as_ref(), "mouseup", false, on_mouse_up)?,
        Listener::attach(document.as_ref(), "click", true, on_click)?,
        Listener::attach(document.as_ref(), "keydown", false, on_key_down)?,
        Listener::attach(window.as_ref(), "resize", false, on_viewport_resize)?,
    ];

    HOST.with(|cell| {
        *cell.borrow_mut() = Some(Host {
            controller,
            window,
            document,
            dom: None,
            timers: TimerRegistry::default(),
            links: LinkRegistry::default(),
            pending_link: None,
            clipboard_rejected: Closure::<dyn FnMut(JsValue)>::new(|err: JsValue| {
                debug!(target: "linkpeek::web", error = ?err, "clipboard write rejected");
            }),
            _listeners: listeners,
        });
    });
    debug!(target: "linkpeek::web", "link preview installed");
    Ok(())
}

fn viewport_of(window: &Window) -> Option<Size> {
    let width = window.inner_width().ok()?.as_f64()?;
    let height = window.inner_height().ok()?.as_f64()?;
    Some(Size::new(width, height))
}

/// Run `f` against the host. Events raised while the host is busy are
/// dropped.
fn with_host<R>(f: impl FnOnce(&mut Host) -> R) -> Option<R> {
    HOST.with(|cell| {
        let Ok(mut guard) = cell.try_borrow_mut() else {
            trace!(target: "linkpeek::web", "re-entrant event dropped");
            return None;
        };
        guard.as_mut().map(f)
    })
}

// ---------------------------------------------------------------------------
// Document listeners
// ---------------------------------------------------------------------------

fn on_mouse_down(event: Event) {
    let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
        return;
    };
    let target = event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok());
    with_host(|host| {
        let inside_preview = match (&host.dom, &target) {
            (Some(dom), Some(target)) => dom.contains(target),
            _ => false,
        };
        let link = target
            .as_ref()
            .and_then(|target| target.closest(LINK_SELECTOR).ok().flatten());
        let down = PointerDown {
            pos: client_pos(mouse),
            buttons: PointerButtons::from_bits_truncate(mouse.buttons()),
            link: link.as_ref().map(link_target),
            inside_preview,
        };
        host.pending_link = link;
        let cmds = host.controller.on_pointer_down(&down);
        host.execute(cmds, Some(&event));
        host.pending_link = None;
    });
}

fn on_mouse_move(event: Event) {
    let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
        return;
    };
    let pos = client_pos(mouse);
    with_host(|host| {
        let cmds = host.controller.on_pointer_move(pos);
        host.execute(cmds, Some(&event));
    });
}

fn on_mouse_up(event: Event) {
    with_host(|host| {
        let cmds = host.controller.on_pointer_up();
        host.execute(cmds, Some(&event));
    });
}

fn on_click(event: Event) {
    let target = event
        .target()
        .and_then(|target| target.dyn_into::<Node>().ok());
    let decision = with_host(|host| {
        let on_session_link = host
            .controller
            .gesture()
            .session_id()
            .and_then(|session| host.links.link(session))
            .zip(target.as_ref())
            .is_some_and(|(link, target)| link.contains(Some(target)));
        host.controller.on_click(on_session_link)
    });
    if decision == Some(ClickDecision::Suppress) {
        event.prevent_default();
        event.stop_immediate_propagation();
    }
}

fn on_key_down(event: Event) {
    let Some(key) = event.dyn_ref::<KeyboardEvent>() else {
        return;
    };
    let key = Key::from_dom(&key.key());
    if key == Key::Other {
        return;
    }
    with_host(|host| {
        let cmds = host.controller.on_key(key);
        host.execute(cmds, Some(&event));
    });
}

fn on_viewport_resize(_event: Event) {
    with_host(|host| {
        if let Some(viewport) = viewport_of(&host.window) {
            host.controller.set_viewport(viewport);
        }
    });
}

fn on_timer(token: TimerToken) {
    with_host(|host| {
        // The callback being run is freed by wasm-bindgen once it returns.
        let _fired = host.timers.take(token);
        let cmds = host.controller.on_timer(token);
        host.execute(cmds, None);
    });
}

/// Entry point for callbacks registered by a mounted window.
pub(crate) fn window_action(id: WindowId, action: WindowAction, event: Option<&Event>) {
    with_host(|host| {
        let cmds = host.window_commands(id, action, event);
        host.execute(cmds, event);
    });
}

// ---------------------------------------------------------------------------
// Command execution
// ---------------------------------------------------------------------------

impl Host {
    fn window_commands(
        &mut self,
        id: WindowId,
        action: WindowAction,
        event: Option<&Event>,
    ) -> Vec<HostCommand> {
        let Some(dom) = self.dom.as_ref().filter(|dom| dom.id() == id) else {
            trace!(target: "linkpeek::web", window = id.get(), ?action, "action for stale window");
            return Vec::new();
        };
        let controller = &mut self.controller;
        match action {
            WindowAction::HeaderDown => event
                .and_then(|event| event.dyn_ref::<MouseEvent>())
                .map(|mouse| controller.on_header_pointer_down(id, client_pos(mouse)))
                .unwrap_or_default(),
            WindowAction::Close => controller.close(),
            WindowAction::ToggleMode => controller.toggle_mode(),
            WindowAction::Submit => controller.submit_address(id, &dom.address()),
            WindowAction::Search => controller.search_address(id, &dom.address()),
            WindowAction::Copy => controller.copy_address(id, &dom.address()),
            WindowAction::Resized => controller.on_resize(id, dom.measured_size()),
            WindowAction::FrameLoaded => controller.on_frame_loaded(id, dom.probe()),
            WindowAction::FrameError => controller.on_frame_error(id),
            WindowAction::InnerLink(href) => controller.on_inner_link_click(id, &href),
            WindowAction::OpenFallback => controller.open_fallback_in_new_tab(id),
        }
    }

    fn execute(&mut self, cmds: Vec<HostCommand>, event: Option<&Event>) {
        for cmd in cmds {
            if let Err(err) = self.apply(cmd, event) {
                warn!(target: "linkpeek::web", error = %err, "host command failed");
            }
        }
    }

    fn apply(&mut self, cmd: HostCommand, event: Option<&Event>) -> Result<(), HostError> {
        match cmd {
            HostCommand::PreventDefault => {
                if let Some(event) = event {
                    event.prevent_default();
                }
            }
            HostCommand::BindLink(session) => {
                if let Some(link) = self.pending_link.clone() {
                    self.links.bind(session, link);
                }
            }
            HostCommand::SetSelectionLock { session, locked } => {
                if locked {
                    let chain = self.links.link(session).map(ancestors).unwrap_or_default();
                    for element in &chain {
                        element
                            .class_list()
                            .add_1(NO_SELECT_CLASS)
                            .map_err(dom_err("classList.add"))?;
                    }
                    self.links.set_locked(session, chain);
                } else {
                    unlock(&self.links.take_locked(session))?;
                }
            }
            HostCommand::SetDragHint { session, visible } => {
                if let Some(link) = self.links.link(session) {
                    link.class_list()
                        .toggle_with_force(DRAG_HINT_CLASS, visible)
                        .map_err(dom_err("classList.toggle"))?;
                }
            }
            HostCommand::ReleaseLink(session) => {
                if let Some(link) = self.links.link(session) {
                    link.class_list()
                        .remove_1(DRAG_HINT_CLASS)
                        .map_err(dom_err("classList.remove"))?;
                }
                unlock(&self.links.release(session))?;
            }
            HostCommand::StartTimer { token, delay } => self.schedule(token, delay)?,
            HostCommand::CancelTimer { token } => {
                if let Some(timer) = self.timers.take(token) {
                    self.window.clear_timeout_with_handle(timer.handle);
                }
            }
            HostCommand::MountWindow(view) => {
                if let Some(stale) = self.dom.take() {
                    stale.remove();
                }
                self.dom = Some(WindowDom::mount(&self.document, &view)?);
            }
            HostCommand::SetWindowRect(rect) => {
                if let Some(dom) = &self.dom {
                    dom.set_rect(rect)?;
                }
            }
            HostCommand::SetAddressLayout(layout) => {
                if let Some(dom) = &self.dom {
                    dom.set_layout(layout)?;
                }
            }
            HostCommand::SetAddressText(text) => {
                if let Some(dom) = &self.dom {
                    dom.set_address(&text);
                }
            }
            HostCommand::SetModeLabel(mode) => {
                if let Some(dom) = &self.dom {
                    dom.set_mode_label(mode);
                }
            }
            HostCommand::SetCopyFeedback(on) => {
                if let Some(dom) = &self.dom {
                    dom.set_copy_feedback(on);
                }
            }
            HostCommand::CopyToClipboard(text) => self.copy_to_clipboard(&text)?,
            HostCommand::LoadFrame(content) => {
                if let Some(dom) = &mut self.dom {
                    dom.load_frame(&content)?;
                }
            }
            HostCommand::ObserveFrameClicks => {
                if let Some(dom) = &mut self.dom {
                    dom.observe_frame_clicks()?;
                }
            }
            HostCommand::ShowFallback { url } => {
                if let Some(dom) = &self.dom {
                    dom.show_fallback(&url)?;
                }
            }
            HostCommand::OpenInNewTab(url) => {
                self.window
                    .open_with_url_and_target(&url, "_blank")
                    .map_err(dom_err("window.open"))?;
            }
            HostCommand::DisconnectResizeObserver => {
                if let Some(dom) = &mut self.dom {
                    dom.disconnect_resize_observer();
                }
            }
            HostCommand::StopMedia => {
                if let Some(dom) = &self.dom {
                    dom.stop_media();
                }
            }
            HostCommand::ReleaseContent => {
                if let Some(dom) = &mut self.dom {
                    dom.release_content();
                }
            }
            HostCommand::RemoveWindow => {
                if let Some(dom) = self.dom.take() {
                    dom.remove();
                }
                trace!(
                    target: "linkpeek::web",
                    timers = self.timers.len(),
                    links = self.links.len(),
                    "preview window removed"
                );
            }
        }
        Ok(())
    }

    /// Write `text` through the async clipboard API, or through a selection
    /// copy where `navigator.clipboard` is missing (insecure origins).
    fn copy_to_clipboard(&self, text: &str) -> Result<(), HostError> {
        match async_clipboard(&self.window.navigator())? {
            Some(clipboard) => write_clipboard(&clipboard, text, &self.clipboard_rejected),
            None => self.copy_via_selection(),
        }
    }

    fn copy_via_selection(&self) -> Result<(), HostError> {
        let Some(dom) = &self.dom else {
            return Ok(());
        };
        let document = self
            .document
            .dyn_ref::<HtmlDocument>()
            .ok_or(HostError::MissingGlobal("HTMLDocument"))?;
        dom.select_address();
        let copied = document
            .exec_command("copy")
            .map_err(dom_err("execCommand"))?;
        if !copied {
            debug!(target: "linkpeek::web", "selection copy refused");
        }
        Ok(())
    }

    fn schedule(&mut self, token: TimerToken, delay: Duration) -> Result<(), HostError> {
        let callback = Closure::<dyn FnMut()>::new(move || on_timer(token));
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let handle = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref::<Function>(),
                millis,
            )
            .map_err(|err| HostError::Timer {
                token,
                detail: format!("{err:?}"),
            })?;
        let timer = PendingTimer {
            handle,
            _callback: callback,
        };
        if let Some(replaced) = self.timers.insert(token, timer) {
            self.window.clear_timeout_with_handle(replaced.handle);
        }
        Ok(())
    }
}

/// `element` and every ancestor element up to the document root.
fn ancestors(element: &Element) -> Vec<Element> {
    let mut chain = vec![element.clone()];
    let mut current = element.parent_element();
    while let Some(parent) = current {
        current = parent.parent_element();
        chain.push(parent);
    }
    chain
}

fn unlock(elements: &[Element]) -> Result<(), HostError> {
    for element in elements {
        element
            .class_list()
            .remove_1(NO_SELECT_CLASS)
            .map_err(dom_err("classList.remove"))?;
    }
    Ok(())
}
