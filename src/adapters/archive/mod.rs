//! Session archival backends.

pub mod filesystem;

pub use filesystem::FilesystemArchiver;
