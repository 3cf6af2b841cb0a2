#![forbid(unsafe_code)]

//! WASM host for linkpeek.
//!
//! On load the module injects its stylesheet, reads settings from
//! `localStorage`, and listens on the document for pointer, click, and key
//! events. Each event is forwarded to a
//! [`linkpeek_core::PreviewController`]; the host executes the returned
//! commands against the DOM and owns every timer, listener, and observer
//! they mention.
//!
//! [`host_core`] holds the platform-independent bookkeeping and is tested
//! natively; everything else is compiled only for `wasm32`.

pub mod host_core;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
pub mod storage;
#[cfg(target_arch = "wasm32")]
mod wasm;

pub use host_core::HostError;

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorageStore;
#[cfg(target_arch = "wasm32")]
pub use wasm::start;
