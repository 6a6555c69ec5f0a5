//! Lexical tokenizer for source code.
//!
//! Splits raw text into lowercase terms suitable for BM25 scoring:
//!
//! 1. Split at Unicode word boundaries and member-access punctuation (`.`, `:`)
//! 2. Split on underscores (`get_user_name` → `get`, `user`, `name`)
//! 3. Split on camelCase / PascalCase boundaries (`HTTPResponse` → `http`, `response`)
//! 4. Lowercase
//! 5. Optionally drop structural keywords (`public`, `static`, `return`, ...)
//!
//! ```
//! use codesearch_utils_tokenizer::CodeTokenizer;
//!
//! let tokenizer = CodeTokenizer::default();
//! assert_eq!(
//!     tokenizer.tokenize("public BookRepository findByTitle"),
//!     vec!["book", "repository", "find", "by", "title"]
//! );
//! ```

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Structural keywords that carry no signal for code search.
///
/// Type-declaration words (`class`, `interface`, `enum`, `struct`) and framework
/// vocabulary (`service`, `controller`, `repository`) are deliberately absent.
pub const CODE_STOPWORDS: &[&str] = &[
    // access modifiers
    "public",
    "private",
    "protected",
    "internal",
    "pub",
    // declaration modifiers
    "static",
    "final",
    "const",
    "abstract",
    "override",
    "virtual",
    "readonly",
    "mut",
    "let",
    "var",
    "val",
    "def",
    "fn",
    "func",
    "function",
    "void",
    // module plumbing
    "import",
    "package",
    "use",
    "from",
    "extends",
    "implements",
    "throws",
    // control flow
    "return",
    "if",
    "else",
    "for",
    "while",
    "do",
    "switch",
    "case",
    "break",
    "continue",
    "try",
    "catch",
    "finally",
    "throw",
    // literals and receivers
    "new",
    "this",
    "self",
    "null",
    "nil",
    "none",
    "true",
    "false",
];

/// Tokenizer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Drop tokens found in [`CODE_STOPWORDS`]
    #[serde(default = "default_true")]
    pub filter_keywords: bool,

    /// Minimum token length in characters
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,

    /// Also emit the whole lowercased identifier ahead of its split parts
    #[serde(default)]
    pub emit_compound: bool,
}

fn default_true() -> bool {
    true
}

fn default_min_token_len() -> usize {
    1
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            filter_keywords: true,
            min_token_len: default_min_token_len(),
            emit_compound: false,
        }
    }
}

/// Identifier-aware tokenizer for code search
#[derive(Debug, Clone, Default)]
pub struct CodeTokenizer {
    config: TokenizerConfig,
}

impl CodeTokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Tokenize raw text or code into lowercase terms
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();

        // UAX#29 keeps `.` and `:` between letters inside a word
        let identifiers = text
            .unicode_words()
            .flat_map(|word| word.split(|c: char| !c.is_alphanumeric() && c != '_'))
            .filter(|identifier| !identifier.is_empty());

        for identifier in identifiers {
            let parts: Vec<String> = identifier
                .split('_')
                .filter(|part| !part.is_empty())
                .flat_map(split_camel_case)
                .map(|part| part.to_lowercase())
                .collect();

            if self.config.emit_compound && parts.len() > 1 {
                self.push_token(&mut tokens, identifier.to_lowercase());
            }

            for part in parts {
                self.push_token(&mut tokens, part);
            }
        }

        tokens
    }

    /// Whether `token` (already lowercased) is a structural keyword
    pub fn is_stopword(token: &str) -> bool {
        CODE_STOPWORDS.contains(&token)
    }

    fn push_token(&self, tokens: &mut Vec<String>, token: String) {
        if token.chars().count() < self.config.min_token_len {
            return;
        }
        if self.config.filter_keywords && Self::is_stopword(&token) {
            return;
        }
        tokens.push(token);
    }
}

/// Split a camelCase or PascalCase identifier into its components.
///
/// `getUserName` → `get`, `User`, `Name`; `HTTPResponse` → `HTTP`, `Response`;
/// `utf8String` → `utf8`, `String`.
fn split_camel_case(s: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars().peekable();
    let mut prev_char: Option<char> = None;

    while let Some(ch) = chars.next() {
        let should_split = match prev_char {
            Some(prev) => {
                ((prev.is_lowercase() || prev.is_ascii_digit()) && ch.is_uppercase())
                    || (prev.is_uppercase()
                        && ch.is_uppercase()
                        && chars.peek().is_some_and(|next| next.is_lowercase()))
            }
            None => false,
        };

        if should_split && !current.is_empty() {
            result.push(std::mem::take(&mut current));
        }

        current.push(ch);
        prev_char = Some(ch);
    }

    if !current.is_empty() {
        result.push(current);
    }

    result
}
