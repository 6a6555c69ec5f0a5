use crate::config::Bm25Params;
use crate::document::Document;
use crate::error::{LexicalError, Result};
use crate::scorer::LexicalScorer;
use crate::stats::CollectionStats;
use log::info;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Named lexical collections.
///
/// Each name owns exactly one [`LexicalScorer`]; rebuilding a collection refits
/// that scorer in place of creating a second index under the same name.
#[derive(Debug, Default)]
pub struct CollectionRegistry {
    params: Bm25Params,
    collections: RwLock<HashMap<String, Arc<LexicalScorer>>>,
}

impl CollectionRegistry {
    pub fn new(params: Bm25Params) -> Result<Self> {
        params.validate().map_err(LexicalError::InvalidParams)?;
        Ok(Self {
            params,
            collections: RwLock::new(HashMap::new()),
        })
    }

    /// Create or refit the collection `name`
    pub fn rebuild<I>(&self, name: &str, documents: I) -> Result<Arc<CollectionStats>>
    where
        I: IntoIterator<Item = Document>,
    {
        let scorer = self.get_or_create(name)?;
        let stats = scorer.fit(documents)?;
        info!(
            "Rebuilt collection '{name}' (generation {})",
            stats.generation()
        );
        Ok(stats)
    }

    /// Scorer for `name`
    pub fn get(&self, name: &str) -> Result<Arc<LexicalScorer>> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| LexicalError::UnknownCollection(name.to_string()))
    }

    /// Current statistics for `name`
    pub fn snapshot(&self, name: &str) -> Result<Arc<CollectionStats>> {
        self.get(name)?.snapshot()
    }

    /// Drop a collection. Outstanding snapshots stay valid.
    pub fn remove(&self, name: &str) -> bool {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    /// Registered collection names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    fn get_or_create(&self, name: &str) -> Result<Arc<LexicalScorer>> {
        if let Ok(existing) = self.get(name) {
            return Ok(existing);
        }

        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = collections.get(name) {
            return Ok(Arc::clone(existing));
        }

        let scorer = Arc::new(LexicalScorer::new(self.params)?);
        collections.insert(name.to_string(), Arc::clone(&scorer));
        Ok(scorer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(id: &str, text: &str) -> Document {
        Document::new(id, text.split_whitespace().map(str::to_string).collect())
    }

    #[test]
    fn test_unknown_collection() {
        let registry = CollectionRegistry::default();
        assert!(matches!(
            registry.snapshot("books"),
            Err(LexicalError::UnknownCollection(name)) if name == "books"
        ));
    }

    #[test]
    fn test_rebuild_reuses_single_scorer() {
        let registry = CollectionRegistry::default();
        registry.rebuild("books", vec![doc("a", "book")]).unwrap();
        let first = registry.get("books").unwrap();

        registry
            .rebuild("books", vec![doc("a", "book"), doc("b", "loan")])
            .unwrap();
        let second = registry.get("books").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.snapshot("books").unwrap().len(), 2);
        assert_eq!(registry.names(), vec!["books".to_string()]);
    }

    #[test]
    fn test_collections_are_isolated() {
        let registry = CollectionRegistry::default();
        registry.rebuild("books", vec![doc("a", "book")]).unwrap();
        registry.rebuild("members", vec![doc("m", "member")]).unwrap();

        assert_eq!(registry.names(), vec!["books".to_string(), "members".to_string()]);
        assert_eq!(registry.snapshot("books").unwrap().index_of("m"), None);
    }

    #[test]
    fn test_remove_keeps_outstanding_snapshot() {
        let registry = CollectionRegistry::default();
        registry.rebuild("books", vec![doc("a", "book")]).unwrap();
        let snapshot = registry.snapshot("books").unwrap();

        assert!(registry.remove("books"));
        assert!(!registry.remove("books"));
        assert_eq!(snapshot.len(), 1);
    }
}
