#![forbid(unsafe_code)]

//! Core: link gesture classification, preview window lifecycle, content
//! strategy, and address navigation.
//!
//! # Role in linkpeek
//! `linkpeek-core` holds every decision the link preview makes. It never
//! touches a browser API: each operation on [`PreviewController`] returns the
//! [`HostCommand`]s the page host applies, in order. Timers are host-owned
//! and identified by [`TimerToken`]s, so stale callbacks are dropped here.
//!
//! # Primary responsibilities
//! - **GestureClassifier**: drag vs. click-and-hold on links, with one-shot
//!   click suppression after a preview.
//! - **PreviewController**: singleton window, geometry, responsive address
//!   bar layout, and ordered teardown.
//! - **Content**: video embed vs. generic frame, with a fallback notice when
//!   the target refuses to render.
//! - **Address**: URL vs. search classification for the address field.
//! - **Settings**: the persisted geometry and mode record.
//!
//! # How it fits in the system
//! `linkpeek-web` owns the DOM, timers, and `localStorage`; it forwards
//! events to the controller and executes the returned commands.

pub mod address;
pub mod content;
pub mod controller;
pub mod geometry;
pub mod gesture;
pub mod settings;
pub mod window;

pub use address::AddressTarget;
pub use content::{ContentDescriptor, ContentKind, ContentState, FrameProbe};
pub use controller::{HostCommand, Key, PreviewController};
pub use geometry::{Point, Size, Viewport, WindowRect};
pub use gesture::{
    ClickDecision, GestureClassifier, GestureConfig, GestureMode, LinkTarget, PointerButtons,
    PointerDown, SessionId, TimerKind, TimerToken,
};
pub use settings::{MemoryStore, Settings, SettingsError, SettingsStore};
pub use window::{AddressLayout, PreviewWindow, WindowId, WindowView};
