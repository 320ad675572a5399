//! IO modules - external system interfaces
//!
//! - `deep_link` - messaging deep link composition
//! - `opener` - hands links to whatever opens them
//! - `map` - map rendering surface used by the tracker
//! - `identity` - hosted and in-memory identity providers
//! - `console` - driver command parsing

pub mod console;
pub mod deep_link;
pub mod identity;
pub mod map;
pub mod opener;

// Re-export commonly used types
pub use console::Command;
pub use deep_link::MessagingLinks;
pub use identity::{LocalIdentityProvider, RestIdentityProvider};
pub use map::{HeadlessMap, MapSurface};
pub use opener::{LinkOpener, LogOpener, RecordingOpener};
