//! Artifact handling - base64 payloads and stored image files

pub mod base64;
pub mod file;

pub use file::ArtifactStore;
