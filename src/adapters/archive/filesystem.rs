//! Filesystem-backed session archiver.
//!
//! Writes one pretty-printed JSON document per archived session under the
//! configured base directory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use crate::domain::errors::DomainResult;
use crate::domain::models::ArchivedSession;
use crate::domain::ports::SessionArchiver;

/// Archiver that persists sessions as `<base>/<session_id>.json`.
pub struct FilesystemArchiver {
    base_path: PathBuf,
}

impl FilesystemArchiver {
    /// Creates an archiver rooted at `base_path`. The directory is created
    /// lazily on first write.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// The path an archived session would be written to.
    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", sanitize(session_id)))
    }
}

/// Session ids are user-supplied; keep them out of path syntax.
fn sanitize(session_id: &str) -> String {
    session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl SessionArchiver for FilesystemArchiver {
    #[instrument(skip(self, document), fields(session_id = %document.session.id))]
    async fn archive(&self, document: &ArchivedSession) -> DomainResult<()> {
        tokio::fs::create_dir_all(&self.base_path).await?;

        let path = self.path_for(&document.session.id);
        let json = serde_json::to_vec_pretty(document)?;
        tokio::fs::write(&path, json).await?;

        debug!(path = %path.display(), "session archived");
        Ok(())
    }
}

impl AsRef<Path> for FilesystemArchiver {
    fn as_ref(&self) -> &Path {
        &self.base_path
    }
}
