//! Speaker profile store.
//!
//! Voice identities are replayed at startup from a [`Manifest`] of cloned
//! samples. Each entry's tensor triple is read from a cached bundle when one
//! exists and computed through the engine otherwise, so cloning is paid for
//! once. New voices are cloned with [`ProfileStore::register_clone`], which
//! either persists the sample, the manifest entry and the bundle together or
//! leaves no trace.

pub mod bundle;
mod error;
pub mod manifest;
mod registry;
mod store;

pub use error::{ProfileError, Result};
pub use manifest::{MANIFEST_FILE, Manifest, ManifestEntry};
pub use registry::{RegistryEntry, VoiceInfo, VoiceKind, VoiceRegistry, language_hint};
pub use store::{CloneRequest, LoadReport, ProfileStore};
