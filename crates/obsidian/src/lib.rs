//! Markdown vault export of the resolution audit trail.

pub mod vault;

pub use vault::{VaultPaths, VaultReport, build_vault};
