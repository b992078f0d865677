use crate::traits::DocumentStore;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

// 文档按相对路径存放在内容根目录下
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, storage_ref: &str) -> Result<PathBuf> {
        let rel = Path::new(storage_ref);
        // 只接受干净的相对路径，拒绝越界
        if rel.components().any(|c| {
            !matches!(c, Component::Normal(_))
        }) {
            bail!("invalid storage ref: {}", storage_ref);
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn fetch_text(&self, storage_ref: &str) -> Result<String> {
        let path = self.resolve(storage_ref)?;
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("document missing: {}", storage_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_traversal() {
        let store = FsDocumentStore::new("/tmp/content");
        assert!(store.resolve("../etc/passwd").is_err());
        assert!(store.resolve("/etc/passwd").is_err());
        assert!(store.resolve("docs/skill.md").is_ok());
    }
}
