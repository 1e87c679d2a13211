//! Persistence reconciler for Vouch.
//!
//! Keeps two stores in step with the controller:
//!
//! - the local store receives the whole envelope synchronously on every
//!   snapshot;
//! - the remote document store receives a chunked copy once changes have been
//!   quiet for the debounce window.
//!
//! Remote failures never reach the controller; they only move the observable
//! [`SyncStatus`] to `Offline`.

mod documents;
mod reconciler;

pub mod error;

pub use documents::{Metadata, fingerprint};
pub use error::{Error, Result};
pub use reconciler::{LoadSource, Loaded, Reconciler, SyncConfig, SyncStatus};

#[cfg(test)]
mod tests;
