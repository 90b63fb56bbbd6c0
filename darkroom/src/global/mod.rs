//! Global singletons.

pub mod preferences;

pub use preferences::{preferences_dir, Preferences};
