use super::RuleStore;
use crate::error::StoreError;
use crate::persist::{read_or_init, write_json_atomic};
use crate::rules::RuleDocument;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// Rule document stored as a JSON file on local disk.
pub struct FileRuleStore {
    path: PathBuf,
}

impl FileRuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RuleStore for FileRuleStore {
    async fn load(&self) -> Result<RuleDocument, StoreError> {
        read_or_init(&self.path, RuleDocument::default()).await
    }

    async fn save(&self, document: &RuleDocument) -> Result<(), StoreError> {
        document.validate()?;
        write_json_atomic(&self.path, document).await?;
        info!(
            "Saved {} interception rules to {}",
            document.rules.len(),
            self.path.display()
        );
        Ok(())
    }
}
