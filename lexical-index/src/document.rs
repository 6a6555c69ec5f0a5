use codesearch_utils_tokenizer::CodeTokenizer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key conventionally holding the originating file path
pub const PATH_KEY: &str = "path";

/// A tokenized document ready to be indexed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Opaque identifier, unique within a collection
    pub id: String,

    /// Ordered lexical terms
    pub terms: Vec<String>,

    /// Free-form metadata echoed into search results
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(id: impl Into<String>, terms: Vec<String>) -> Self {
        Self {
            id: id.into(),
            terms,
            metadata: BTreeMap::new(),
        }
    }

    /// Tokenize `text` into a new document
    pub fn from_text(id: impl Into<String>, text: &str, tokenizer: &CodeTokenizer) -> Self {
        Self::new(id, tokenizer.tokenize(text))
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Number of terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Originating file path, if recorded
    pub fn path(&self) -> Option<&str> {
        self.metadata.get(PATH_KEY).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_text() {
        let tokenizer = CodeTokenizer::default();
        let doc = Document::from_text("Book.java", "public class Book", &tokenizer)
            .with_metadata(PATH_KEY, "src/main/java/Book.java");

        assert_eq!(doc.terms, vec!["class", "book"]);
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.path(), Some("src/main/java/Book.java"));
    }

    #[test]
    fn test_metadata_defaults_when_missing() {
        let doc: Document = serde_json::from_str(r#"{"id": "a", "terms": ["x"]}"#).unwrap();
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.path(), None);
    }
}
