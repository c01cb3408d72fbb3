//! Collaborator implementations.

pub mod mock;

pub use mock::{MockCollaborator, MockGeneration};
