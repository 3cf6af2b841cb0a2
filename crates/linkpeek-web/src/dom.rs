#![forbid(unsafe_code)]

//! DOM side of the preview window.
//!
//! [`WindowDom`] owns the nodes, listeners, and resize observer of one
//! mounted window. Every callback forwards a [`WindowAction`] tagged with the
//! window's id to the host, which drops actions for replaced windows.

use js_sys::{Function, Promise, Reflect};
use linkpeek_core::content::INERT_URL;
use linkpeek_core::{
    AddressLayout, ContentDescriptor, FrameProbe, GestureMode, LinkTarget, Point, Size, WindowId,
    WindowRect, WindowView,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, HtmlIFrameElement, HtmlInputElement,
    KeyboardEvent, MouseEvent, Node, ResizeObserver,
};

use crate::host_core::{
    FALLBACK_ACTION, FALLBACK_MESSAGE, HostError, LAYOUT_CLASSES, STYLE_ID, STYLESHEET,
    WINDOW_CLASS, WINDOW_TITLE, copy_label, layout_class, rect_style,
};

const HIDDEN_CLASS: &str = "linkpeek-hidden";
const GO_LABEL: &str = "\u{2192}";
const SEARCH_LABEL: &str = "\u{1f50d}";
const CLOSE_LABEL: &str = "\u{d7}";

/// User interaction on a mounted window.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum WindowAction {
    HeaderDown,
    Close,
    ToggleMode,
    Submit,
    Search,
    Copy,
    Resized,
    FrameLoaded,
    FrameError,
    InnerLink(String),
    OpenFallback,
}

pub(crate) fn dom_err(op: &'static str) -> impl FnOnce(JsValue) -> HostError {
    move |err| HostError::Dom {
        op,
        detail: format!("{err:?}"),
    }
}

/// Viewport-relative pointer position of a mouse event.
pub(crate) fn client_pos(event: &MouseEvent) -> Point {
    Point::new(f64::from(event.client_x()), f64::from(event.client_y()))
}

/// Describe a link-like element for the gesture classifier.
pub(crate) fn link_target(element: &Element) -> LinkTarget {
    LinkTarget {
        href: string_prop(element, "href"),
        data_href: element.get_attribute("data-href"),
    }
}

/// String-valued JS property; `None` for SVG animated values and absent
/// properties.
fn string_prop(target: &JsValue, name: &str) -> Option<String> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.as_string())
}

/// `navigator.clipboard`, or `None` where the page is not a secure context.
pub(crate) fn async_clipboard(navigator: &JsValue) -> Result<Option<JsValue>, HostError> {
    let clipboard = Reflect::get(navigator, &JsValue::from_str("clipboard"))
        .map_err(dom_err("navigator.clipboard"))?;
    Ok((!clipboard.is_undefined() && !clipboard.is_null()).then_some(clipboard))
}

/// Start `clipboard.writeText(text)`. A rejected write is routed to
/// `on_reject`; a synchronous throw comes back as an error.
///
/// Only catching bindings are used. An exception unwinding through the host
/// would leave its cell borrowed.
pub(crate) fn write_clipboard(
    clipboard: &JsValue,
    text: &str,
    on_reject: &Closure<dyn FnMut(JsValue)>,
) -> Result<(), HostError> {
    let write_text = Reflect::get(clipboard, &JsValue::from_str("writeText"))
        .map_err(dom_err("clipboard.writeText"))?
        .dyn_into::<Function>()
        .map_err(dom_err("clipboard.writeText"))?;
    let pending = write_text
        .call1(clipboard, &JsValue::from_str(text))
        .map_err(dom_err("clipboard.writeText"))?;
    if let Ok(promise) = pending.dyn_into::<Promise>() {
        let _handled = promise.catch(on_reject);
    }
    Ok(())
}

/// Inject the shared stylesheet once per document.
pub(crate) fn install_stylesheet(document: &Document) -> Result<(), HostError> {
    if document.get_element_by_id(STYLE_ID).is_some() {
        return Ok(());
    }
    let style = document
        .create_element("style")
        .map_err(dom_err("create_element"))?;
    style.set_id(STYLE_ID);
    style.set_text_content(Some(STYLESHEET));
    let parent: Node = match document.head() {
        Some(head) => head.into(),
        None => document
            .document_element()
            .ok_or(HostError::MissingGlobal("document.documentElement"))?
            .into(),
    };
    parent
        .append_child(&style)
        .map_err(dom_err("append_child"))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// An event listener that detaches itself when dropped.
pub(crate) struct Listener {
    target: EventTarget,
    kind: &'static str,
    capture: bool,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub(crate) fn attach(
        target: &EventTarget,
        kind: &'static str,
        capture: bool,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, HostError> {
        let callback = Closure::<dyn FnMut(Event)>::new(handler);
        target
            .add_event_listener_with_callback_and_bool(
                kind,
                callback.as_ref().unchecked_ref::<Function>(),
                capture,
            )
            .map_err(dom_err("addEventListener"))?;
        Ok(Self {
            target: target.clone(),
            kind,
            capture,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback_and_bool(
            self.kind,
            self.callback.as_ref().unchecked_ref::<Function>(),
            self.capture,
        );
    }
}

// ---------------------------------------------------------------------------
// WindowDom
// ---------------------------------------------------------------------------

fn create<T: JsCast>(document: &Document, tag: &str, class: &str) -> Result<T, HostError> {
    let element = document
        .create_element(tag)
        .map_err(dom_err("create_element"))?;
    element.set_class_name(class);
    element.dyn_into::<T>().map_err(|_| HostError::Dom {
        op: "cast",
        detail: tag.to_owned(),
    })
}

fn button(
    document: &Document,
    class: &str,
    label: &str,
    title: &str,
) -> Result<HtmlElement, HostError> {
    let button: HtmlElement = create(document, "button", class)?;
    button
        .set_attribute("type", "button")
        .map_err(dom_err("set_attribute"))?;
    button.set_text_content(Some(label));
    button.set_title(title);
    Ok(button)
}

fn append(parent: &Node, children: &[&Node]) -> Result<(), HostError> {
    for child in children {
        parent.append_child(child).map_err(dom_err("append_child"))?;
    }
    Ok(())
}

fn set_hidden(element: &Element, hidden: bool) -> Result<(), HostError> {
    element
        .class_list()
        .toggle_with_force(HIDDEN_CLASS, hidden)
        .map(|_| ())
        .map_err(dom_err("classList.toggle"))
}

/// Forward a window action to the host.
fn forward(id: WindowId, action: WindowAction) -> impl FnMut(Event) + 'static {
    move |event: Event| {
        event.stop_propagation();
        super::wasm::window_action(id, action.clone(), Some(&event));
    }
}

/// Mounted preview window.
pub(crate) struct WindowDom {
    id: WindowId,
    root: HtmlElement,
    address: HtmlInputElement,
    copy_button: HtmlElement,
    mode_button: HtmlElement,
    frame: HtmlIFrameElement,
    fallback: HtmlElement,
    listeners: Vec<Listener>,
    frame_listeners: Vec<Listener>,
    inner_click: Option<Listener>,
    resize: Option<(ResizeObserver, Closure<dyn FnMut()>)>,
}

impl WindowDom {
    /// Build the window from `view` and attach it to the document body.
    pub(crate) fn mount(document: &Document, view: &WindowView) -> Result<Self, HostError> {
        let body = document
            .body()
            .ok_or(HostError::MissingGlobal("document.body"))?;
        let id = view.id;

        let root: HtmlElement = create(document, "div", WINDOW_CLASS)?;
        let header: HtmlElement = create(document, "div", "linkpeek-header")?;
        let title: HtmlElement = create(document, "span", "linkpeek-title")?;
        title.set_text_content(Some(WINDOW_TITLE));
        let address: HtmlInputElement = create(document, "input", "linkpeek-address")?;
        address.set_type("text");
        address.set_value(&view.address_text);
        address.set_spellcheck(false);
        let go_button = button(document, "linkpeek-go", GO_LABEL, "Go to address")?;
        let copy_button = button(
            document,
            "linkpeek-copy linkpeek-tool",
            copy_label(false),
            "Copy URL",
        )?;
        let search_button = button(
            document,
            "linkpeek-search linkpeek-tool",
            SEARCH_LABEL,
            "Search with URL",
        )?;
        let mode_button = button(
            document,
            "linkpeek-mode",
            view.mode.label(),
            "Toggle drag / click-and-hold",
        )?;
        let close_button = button(document, "linkpeek-close", CLOSE_LABEL, "Close preview")?;
        append(
            &header,
            &[
                &title,
                &address,
                &go_button,
                &copy_button,
                &search_button,
                &mode_button,
                &close_button,
            ],
        )?;

        let body_el: HtmlElement = create(document, "div", "linkpeek-body")?;
        let frame: HtmlIFrameElement = create(document, "iframe", "linkpeek-frame")?;
        let fallback: HtmlElement = create(document, "div", "linkpeek-fallback")?;
        set_hidden(&fallback, true)?;
        let message: HtmlElement = create(document, "p", "linkpeek-fallback-message")?;
        message.set_text_content(Some(FALLBACK_MESSAGE));
        let open_button = button(document, "linkpeek-open", FALLBACK_ACTION, "")?;
        append(&fallback, &[&message, &open_button])?;
        append(&body_el, &[&frame, &fallback])?;
        append(&root, &[&header, &body_el])?;

        let header_target: &EventTarget = header.as_ref();
        let listeners = vec![
            Listener::attach(header_target, "mousedown", false, move |event: Event| {
                let on_control = event
                    .target()
                    .and_then(|target| target.dyn_into::<Element>().ok())
                    .and_then(|target| target.closest("input, button").ok().flatten())
                    .is_some();
                if !on_control {
                    super::wasm::window_action(id, WindowAction::HeaderDown, Some(&event));
                }
            })?,
            Listener::attach(
                close_button.as_ref(),
                "click",
                false,
                forward(id, WindowAction::Close),
            )?,
            Listener::attach(
                go_button.as_ref(),
                "click",
                false,
                forward(id, WindowAction::Submit),
            )?,
            Listener::attach(
                mode_button.as_ref(),
                "click",
                false,
                forward(id, WindowAction::ToggleMode),
            )?,
            Listener::attach(
                copy_button.as_ref(),
                "click",
                false,
                forward(id, WindowAction::Copy),
            )?,
            Listener::attach(
                search_button.as_ref(),
                "click",
                false,
                forward(id, WindowAction::Search),
            )?,
            Listener::attach(
                open_button.as_ref(),
                "click",
                false,
                forward(id, WindowAction::OpenFallback),
            )?,
            Listener::attach(address.as_ref(), "keydown", false, move |event: Event| {
                let enter = event
                    .dyn_ref::<KeyboardEvent>()
                    .is_some_and(|key| key.key() == "Enter");
                if enter {
                    event.prevent_default();
                    super::wasm::window_action(id, WindowAction::Submit, Some(&event));
                }
            })?,
        ];

        let mut dom = Self {
            id,
            root,
            address,
            copy_button,
            mode_button,
            frame,
            fallback,
            listeners,
            frame_listeners: Vec::new(),
            inner_click: None,
            resize: None,
        };
        dom.set_rect(view.rect)?;
        dom.set_layout(view.layout)?;
        body.append_child(&dom.root).map_err(dom_err("append_child"))?;
        dom.observe_resize()?;
        Ok(dom)
    }

    pub(crate) const fn id(&self) -> WindowId {
        self.id
    }

    /// Whether `node` lies inside the window.
    pub(crate) fn contains(&self, node: &Node) -> bool {
        self.root.contains(Some(node))
    }

    pub(crate) fn address(&self) -> String {
        self.address.value()
    }

    pub(crate) fn measured_size(&self) -> Size {
        Size::new(
            f64::from(self.root.offset_width()),
            f64::from(self.root.offset_height()),
        )
    }

    /// Same-origin documents are readable; anything else comes back null.
    pub(crate) fn probe(&self) -> FrameProbe {
        match self.frame.content_document() {
            Some(_) => FrameProbe::Accessible,
            None => FrameProbe::Blocked,
        }
    }

    pub(crate) fn set_rect(&self, rect: WindowRect) -> Result<(), HostError> {
        let style = self.root.style();
        for (name, value) in rect_style(rect) {
            style
                .set_property(name, &value)
                .map_err(dom_err("style.setProperty"))?;
        }
        Ok(())
    }

    pub(crate) fn set_layout(&self, layout: AddressLayout) -> Result<(), HostError> {
        let classes = self.root.class_list();
        for class in LAYOUT_CLASSES {
            classes.remove_1(class).map_err(dom_err("classList.remove"))?;
        }
        if let Some(class) = layout_class(layout) {
            classes.add_1(class).map_err(dom_err("classList.add"))?;
        }
        Ok(())
    }

    pub(crate) fn set_address(&self, text: &str) {
        self.address.set_value(text);
    }

    /// Select the address text for a selection-based copy.
    pub(crate) fn select_address(&self) {
        let _ = self.address.focus();
        self.address.select();
    }

    pub(crate) fn set_mode_label(&self, mode: GestureMode) {
        self.mode_button.set_text_content(Some(mode.label()));
    }

    pub(crate) fn set_copy_feedback(&self, on: bool) {
        self.copy_button.set_text_content(Some(copy_label(on)));
    }

    /// Show the frame and point it at `content`.
    pub(crate) fn load_frame(&mut self, content: &ContentDescriptor) -> Result<(), HostError> {
        self.release_content();
        set_hidden(&self.fallback, true)?;
        set_hidden(&self.frame, false)?;
        match content.allow() {
            Some(allow) => {
                self.frame
                    .set_attribute("allow", allow)
                    .map_err(dom_err("set_attribute"))?;
                self.frame.set_allow_fullscreen(true);
            }
            None => {
                self.frame
                    .remove_attribute("allow")
                    .map_err(dom_err("remove_attribute"))?;
                self.frame.set_allow_fullscreen(false);
            }
        }
        if content.is_observed() {
            let id = self.id;
            let target: &EventTarget = self.frame.as_ref();
            self.frame_listeners = vec![
                Listener::attach(target, "load", false, move |event: Event| {
                    super::wasm::window_action(id, WindowAction::FrameLoaded, Some(&event));
                })?,
                Listener::attach(target, "error", false, move |event: Event| {
                    super::wasm::window_action(id, WindowAction::FrameError, Some(&event));
                })?,
            ];
        }
        self.frame.set_src(&content.src);
        Ok(())
    }

    /// Redirect link clicks inside the frame's document to the preview.
    pub(crate) fn observe_frame_clicks(&mut self) -> Result<(), HostError> {
        let Some(document) = self.frame.content_document() else {
            return Ok(());
        };
        let id = self.id;
        let listener = Listener::attach(document.as_ref(), "click", true, move |event: Event| {
            let Some(href) = inner_link_href(&event) else {
                return;
            };
            event.prevent_default();
            super::wasm::window_action(id, WindowAction::InnerLink(href), Some(&event));
        })?;
        self.inner_click = Some(listener);
        Ok(())
    }

    /// Hide the frame behind the fallback notice.
    pub(crate) fn show_fallback(&self, url: &str) -> Result<(), HostError> {
        set_hidden(&self.frame, true)?;
        self.fallback.set_title(url);
        set_hidden(&self.fallback, false)
    }

    pub(crate) fn disconnect_resize_observer(&mut self) {
        if let Some((observer, _callback)) = self.resize.take() {
            observer.disconnect();
        }
    }

    pub(crate) fn stop_media(&self) {
        self.frame.set_src(INERT_URL);
    }

    /// Drop load, error, and inner-click observers.
    pub(crate) fn release_content(&mut self) {
        self.frame_listeners.clear();
        self.inner_click = None;
    }

    /// Detach the window from the document. Listeners drop with `self`.
    pub(crate) fn remove(mut self) {
        self.disconnect_resize_observer();
        self.release_content();
        self.listeners.clear();
        self.root.remove();
    }

    fn observe_resize(&mut self) -> Result<(), HostError> {
        let id = self.id;
        let callback = Closure::<dyn FnMut()>::new(move || {
            super::wasm::window_action(id, WindowAction::Resized, None);
        });
        let observer = ResizeObserver::new(callback.as_ref().unchecked_ref::<Function>())
            .map_err(dom_err("ResizeObserver"))?;
        observer.observe(&self.root);
        self.resize = Some((observer, callback));
        Ok(())
    }
}

/// Resolved `href` of the anchor a frame click landed on.
fn inner_link_href(event: &Event) -> Option<String> {
    // Nodes from the frame's realm fail `instanceof` against this window.
    let target: Element = event.target()?.unchecked_into();
    let anchor = target.closest("a[href]").ok()??;
    string_prop(&anchor, "href").filter(|href| !href.is_empty())
}
