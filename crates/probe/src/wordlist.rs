//! Candidate field names.

use crate::error::WordlistError;
use std::collections::HashSet;
use std::path::Path;

/// Names tried when no wordlist is supplied.
pub const DEFAULT_WORDS: &[&str] = &[
    "user",
    "users",
    "me",
    "viewer",
    "node",
    "nodes",
    "query",
    "id",
    "name",
    "email",
    "password",
    "username",
    "profile",
    "login",
    "logout",
    "register",
    "authenticate",
    "create",
    "update",
    "delete",
    "get",
    "list",
    "search",
    "admin",
    "config",
    "settings",
    "system",
    "__schema",
    "__type",
    "__typename",
];

/// An ordered, duplicate-free list of candidate field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wordlist {
    words: Vec<String>,
}

impl Default for Wordlist {
    fn default() -> Self {
        Self::new(DEFAULT_WORDS.iter().copied())
    }
}

impl Wordlist {
    /// Builds a wordlist, dropping invalid names and repeats.
    #[must_use]
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut wordlist = Self { words: Vec::new() };
        wordlist.extend(words);
        wordlist
    }

    /// Parses newline-delimited names.
    ///
    /// Lines are trimmed. Blank lines and lines starting with `#` are ignored.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn load(path: &Path) -> Result<Self, WordlistError> {
        let text = std::fs::read_to_string(path).map_err(|source| WordlistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Loads `path` if given, falling back to [`DEFAULT_WORDS`] when the file is
    /// missing, unreadable or empty.
    #[must_use]
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match Self::load(path) {
            Ok(wordlist) if !wordlist.is_empty() => {
                tracing::info!(path = %path.display(), words = wordlist.len(), "Loaded wordlist");
                wordlist
            }
            Ok(_) => {
                tracing::warn!(path = %path.display(), "Wordlist is empty, using default wordlist");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Using default wordlist");
                Self::default()
            }
        }
    }

    /// Appends names not already present.
    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen: HashSet<String> = self.words.iter().cloned().collect();
        for word in words {
            let word = word.into();
            if !is_valid_name(&word) {
                tracing::debug!(word = %word, "Skipping invalid field name");
                continue;
            }
            if seen.insert(word.clone()) {
                self.words.push(word);
            }
        }
    }

    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Returns true if `name` matches `[_A-Za-z][_0-9A-Za-z]*`.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
