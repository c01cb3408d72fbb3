//! Adapters behind the domain ports.

pub mod archive;
pub mod collaborators;
