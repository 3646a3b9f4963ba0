use super::RuleStore;
use crate::error::StoreError;
use crate::rules::RuleDocument;
use async_trait::async_trait;
use parking_lot::RwLock;

/// In-memory rule store, for tests and embedding.
#[derive(Default)]
pub struct InMemoryRuleStore {
    document: RwLock<RuleDocument>,
}

impl InMemoryRuleStore {
    pub fn new(document: RuleDocument) -> Self {
        Self {
            document: RwLock::new(document),
        }
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn load(&self) -> Result<RuleDocument, StoreError> {
        Ok(self.document.read().clone())
    }

    async fn save(&self, document: &RuleDocument) -> Result<(), StoreError> {
        document.validate()?;
        *self.document.write() = document.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;

    #[tokio::test]
    async fn test_round_trip() {
        let store = InMemoryRuleStore::default();
        let doc = RuleDocument::new(vec![Rule::new("https://example.com/", "a.bin")]);
        store.save(&doc).await.unwrap();
        assert_eq!(store.load().await.unwrap(), doc);
    }

    #[tokio::test]
    async fn test_rejects_invalid_without_change() {
        let doc = RuleDocument::new(vec![Rule::new("https://example.com/", "a.bin")]);
        let store = InMemoryRuleStore::new(doc.clone());
        let bad = RuleDocument::new(vec![Rule::new("::", "a.bin")]);
        assert!(store.save(&bad).await.is_err());
        assert_eq!(store.load().await.unwrap(), doc);
    }
}
