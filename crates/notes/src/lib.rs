//! Markdown notes for classified bills.

pub mod vault;

pub use vault::{VaultPaths, build_notes, note_slug};
