//! Mapping of request paths onto the directory being served.

use std::path::{Path, PathBuf};

use anyhow::Context;

/// The directory files are served from.
#[derive(Debug, Clone)]
pub struct DocumentRoot {
    base: PathBuf,
    confine: bool,
}

impl DocumentRoot {
    /// Creates a document root at `base`.
    ///
    /// With `confine` set, `base` is canonicalized here and must exist;
    /// resolved paths are then kept inside it.
    pub async fn new(base: impl Into<PathBuf>, confine: bool) -> anyhow::Result<Self> {
        let base = base.into();
        let base = if confine {
            tokio::fs::canonicalize(&base)
                .await
                .with_context(|| format!("document root {} is not accessible", base.display()))?
        } else {
            base
        };

        Ok(Self { base, confine })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn is_confined(&self) -> bool {
        self.confine
    }

    /// Resolves a decoded request path to the file to open.
    ///
    /// Returns `None` when confinement is on and the path does not exist or
    /// its canonical form lies outside the root. Without confinement the
    /// joined path is returned as is, including `..` segments.
    pub async fn resolve(&self, relative: &Path) -> Option<PathBuf> {
        let joined = self.base.join(relative);
        if !self.confine {
            return Some(joined);
        }

        let canonical = tokio::fs::canonicalize(&joined).await.ok()?;
        if canonical.starts_with(&self.base) {
            Some(canonical)
        } else {
            tracing::warn!(path = %relative.display(), "Request path escapes document root");
            None
        }
    }
}
