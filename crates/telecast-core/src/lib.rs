//! Channel-state reconciliation for an IPTV front-end.
//!
//! The registry merges three sources into one authoritative in-memory
//! channel list: the remote catalog, a hard-coded fallback set used when
//! the catalog is empty or unreachable, and user-added streams. A
//! background monitor prunes live-broadcast channels that stop
//! broadcasting. This crate is a library; the consuming UI supplies
//! configuration and reads snapshots or subscribes to change events.

pub mod catalog;
pub mod channel;
pub mod config;
pub mod error;
pub mod fallback;
mod monitor;
pub mod prefs;
pub mod registry;

pub use catalog::RemoteCatalogClient;
pub use channel::{Channel, StreamKind, UserStreamDescriptor};
pub use config::Config;
pub use error::{CatalogError, RegistryError};
pub use prefs::Preferences;
pub use registry::{
    ChannelRegistry, LoadState, RegistryEvent, RegistrySnapshot, VolumeInfo,
};
