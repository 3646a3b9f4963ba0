//! Rule storage.
//!
//! The engine never caches rules: each request asks the store for a fresh
//! [`RuleDocument`]. Replacing the rule set is whole-document only.

mod file;
mod inmemory;

pub use file::FileRuleStore;
pub use inmemory::InMemoryRuleStore;

use crate::error::StoreError;
use crate::rules::RuleDocument;
use async_trait::async_trait;

/// Backend-agnostic trait for the rule document.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Load the current document, creating an empty one if none exists yet.
    async fn load(&self) -> Result<RuleDocument, StoreError>;

    /// Validate and replace the whole document.
    ///
    /// On validation failure the previous document is left untouched.
    async fn save(&self, document: &RuleDocument) -> Result<(), StoreError>;
}
