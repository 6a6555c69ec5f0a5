use crate::dataset::{Answer, GroundTruthSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Source roots stripped from file paths before conversion to a symbol
pub const DEFAULT_SOURCE_ROOTS: [&str; 7] = [
    "src/main/java/",
    "src/test/java/",
    "src/main/kotlin/",
    "src/main/scala/",
    "src/",
    "lib/",
    "app/",
];

/// Path segments that start a reverse-domain package name
pub const DEFAULT_NAMESPACE_ROOTS: [&str; 6] = ["com", "org", "net", "io", "edu", "gov"];

/// Extensions that mark a separator-free answer as a file name
const SOURCE_EXTENSIONS: [&str; 16] = [
    "java", "kt", "kts", "scala", "groovy", "rs", "py", "js", "jsx", "ts", "tsx", "go", "cs",
    "rb", "php", "swift",
];

/// Answer normalization configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerNormalizerConfig {
    /// Compare with case preserved
    #[serde(default = "default_true")]
    pub case_sensitive: bool,

    /// Reduce member references to their enclosing type
    #[serde(default)]
    pub strip_method_names: bool,

    /// Source roots, matched longest first
    #[serde(default = "default_source_roots")]
    pub source_roots: Vec<String>,

    #[serde(default = "default_namespace_roots")]
    pub namespace_roots: Vec<String>,

    /// Separator joining symbol segments
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_true() -> bool {
    true
}

fn default_source_roots() -> Vec<String> {
    DEFAULT_SOURCE_ROOTS.into_iter().map(String::from).collect()
}

fn default_namespace_roots() -> Vec<String> {
    DEFAULT_NAMESPACE_ROOTS.into_iter().map(String::from).collect()
}

fn default_separator() -> String {
    ".".to_string()
}

impl Default for AnswerNormalizerConfig {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            strip_method_names: false,
            source_roots: default_source_roots(),
            namespace_roots: default_namespace_roots(),
            separator: default_separator(),
        }
    }
}

impl AnswerNormalizerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.separator.is_empty() {
            return Err("separator must not be empty".to_string());
        }
        if let Some(root) = self.source_roots.iter().find(|r| r.trim_matches('/').is_empty()) {
            return Err(format!("invalid source root: '{root}'"));
        }
        Ok(())
    }

    /// Case-insensitive matching of enclosing types
    pub fn lenient() -> Self {
        Self {
            case_sensitive: false,
            strip_method_names: true,
            ..Default::default()
        }
    }
}

/// Reconciles file paths and qualified symbol names into one comparable form.
///
/// `src/main/java/com/acme/lib/Book.java` and `com.acme.lib.Book` both
/// normalize to `com.acme.lib.Book`.
#[derive(Debug, Clone)]
pub struct AnswerNormalizer {
    config: AnswerNormalizerConfig,
    /// Normalized roots (`/`-terminated), longest first
    source_roots: Vec<String>,
}

impl Default for AnswerNormalizer {
    fn default() -> Self {
        Self::build(AnswerNormalizerConfig::default())
    }
}

impl AnswerNormalizer {
    pub fn new(config: AnswerNormalizerConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: AnswerNormalizerConfig) -> Self {
        let mut source_roots: Vec<String> = config
            .source_roots
            .iter()
            .map(|root| format!("{}/", root.replace('\\', "/").trim_matches('/')))
            .collect();
        source_roots.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        source_roots.dedup();

        Self {
            config,
            source_roots,
        }
    }

    pub fn config(&self) -> &AnswerNormalizerConfig {
        &self.config
    }

    /// Normalize one answer or prediction; empty input yields an empty string
    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let mut symbol = if Self::is_path(trimmed) {
            self.path_to_symbol(trimmed)
        } else {
            trimmed.to_string()
        };

        if self.config.strip_method_names {
            symbol = self.enclosing_type(&symbol);
        }

        if self.config.case_sensitive {
            symbol
        } else {
            symbol.to_lowercase()
        }
    }

    /// Normalized, deduplicated ground truth; empty forms are dropped
    pub fn normalize_answers(&self, answer: &Answer) -> GroundTruthSet {
        answer
            .values()
            .iter()
            .map(|value| self.normalize(value))
            .filter(|value| !value.is_empty())
            .collect()
    }

    /// Normalized predictions, first occurrence kept
    pub fn normalize_predictions(&self, predictions: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        predictions
            .iter()
            .map(|value| self.normalize(value))
            .filter(|value| !value.is_empty() && seen.insert(value.clone()))
            .collect()
    }

    fn is_path(value: &str) -> bool {
        if value.contains('/') || value.contains('\\') {
            return true;
        }
        value
            .rsplit_once('.')
            .is_some_and(|(stem, ext)| !stem.is_empty() && SOURCE_EXTENSIONS.contains(&ext))
    }

    fn path_to_symbol(&self, path: &str) -> String {
        let path = path.replace('\\', "/");
        let path = path.trim_start_matches("./").trim_start_matches('/');

        let segments: Vec<&str> = match self.strip_source_root(path) {
            Some(relative) => relative.split('/').filter(|s| !s.is_empty()).collect(),
            None => {
                let all: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
                match all.iter().position(|s| self.is_namespace_root(s)) {
                    Some(start) => all[start..].to_vec(),
                    None => all.last().copied().into_iter().collect(),
                }
            }
        };

        let Some((last, parents)) = segments.split_last() else {
            return String::new();
        };

        let file_stem = match last.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => *last,
        };

        parents
            .iter()
            .copied()
            .chain(std::iter::once(file_stem))
            .collect::<Vec<_>>()
            .join(&self.config.separator)
    }

    /// Remainder after the longest source root found at a segment boundary
    fn strip_source_root<'a>(&self, path: &'a str) -> Option<&'a str> {
        self.source_roots.iter().find_map(|root| {
            path.strip_prefix(root.as_str()).or_else(|| {
                let nested = format!("/{root}");
                path.find(&nested).map(|index| &path[index + nested.len()..])
            })
        })
    }

    fn is_namespace_root(&self, segment: &str) -> bool {
        self.config.namespace_roots.iter().any(|root| root == segment)
    }

    /// `Type.method(args)`, `Type#member`, `Type::member` → `Type`
    fn enclosing_type(&self, symbol: &str) -> String {
        let mut symbol = symbol;

        if let Some(open) = symbol.find('(').filter(|_| symbol.ends_with(')')) {
            symbol = &symbol[..open];
        }
        if let Some((head, _)) = symbol.split_once('#') {
            symbol = head;
        }
        if let Some((head, _)) = symbol.rsplit_once("::") {
            symbol = head;
        }

        let separator = self.config.separator.as_str();
        if let Some((head, member)) = symbol.rsplit_once(separator) {
            let owner = head.rsplit(separator).next().unwrap_or(head);
            if starts_lowercase(member) && starts_uppercase(owner) {
                symbol = head;
            }
        }

        symbol.to_string()
    }
}

fn starts_lowercase(value: &str) -> bool {
    value.chars().next().is_some_and(char::is_lowercase)
}

fn starts_uppercase(value: &str) -> bool {
    value.chars().next().is_some_and(char::is_uppercase)
}
