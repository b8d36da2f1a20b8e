//! Precedence table: ordered binary-operator groups with associativity
//!
//! Operators are named by their token rule (`POW`, not `^`). A higher level
//! binds tighter. The table is always an explicit input; nothing is inferred
//! from the order rules were declared in.

use crate::config::compile_time::grammar::MAX_PRECEDENCE_LEVELS;
use crate::grammar::{GrammarError, GrammarResult};
use crate::logging::{codes, Code};
use crate::{log_error, log_success};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Associativity {
    /// `a - b - c` groups as `(a - b) - c`
    Left,
    /// `a ^ b ^ c` groups as `a ^ (b ^ c)`
    Right,
}

impl Associativity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Associativity::Left => "left",
            Associativity::Right => "right",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecedenceEntry {
    pub level: i32,
    pub operators: Vec<String>,
    pub associativity: Associativity,
}

impl PrecedenceEntry {
    pub fn new(
        level: i32,
        operators: impl IntoIterator<Item = impl Into<String>>,
        associativity: Associativity,
    ) -> Self {
        Self {
            level,
            operators: operators.into_iter().map(Into::into).collect(),
            associativity,
        }
    }

    pub fn contains(&self, operator: &str) -> bool {
        self.operators.iter().any(|op| op == operator)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecedenceTable {
    #[serde(rename = "level", default)]
    entries: Vec<PrecedenceEntry>,
}

impl PrecedenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a left-associative level
    pub fn left(self, level: i32, operators: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.with_entry(PrecedenceEntry::new(level, operators, Associativity::Left))
    }

    /// Add a right-associative level
    pub fn right(self, level: i32, operators: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.with_entry(PrecedenceEntry::new(level, operators, Associativity::Right))
    }

    pub fn with_entry(mut self, entry: PrecedenceEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Entries in declaration order
    pub fn entries(&self) -> &[PrecedenceEntry] {
        &self.entries
    }

    /// Entries ordered loosest to tightest
    pub fn levels_loosest_first(&self) -> Vec<&PrecedenceEntry> {
        let mut entries: Vec<&PrecedenceEntry> = self.entries.iter().collect();
        entries.sort_by_key(|entry| entry.level);
        entries
    }

    /// Entry that lists `operator`
    pub fn level_of(&self, operator: &str) -> Option<&PrecedenceEntry> {
        self.entries.iter().find(|entry| entry.contains(operator))
    }

    pub fn entry_for_level(&self, level: i32) -> Option<&PrecedenceEntry> {
        self.entries.iter().find(|entry| entry.level == level)
    }

    pub fn operators(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .flat_map(|entry| entry.operators.iter().map(String::as_str))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check uniqueness of levels and operators
    pub fn validate(&self) -> GrammarResult<()> {
        if self.entries.len() > MAX_PRECEDENCE_LEVELS {
            return Err(GrammarError::limit_exceeded(
                "precedence levels",
                self.entries.len(),
                MAX_PRECEDENCE_LEVELS,
            ));
        }

        let mut levels = BTreeSet::new();
        let mut owners: HashMap<&str, i32> = HashMap::new();

        for entry in &self.entries {
            if !levels.insert(entry.level) {
                return Err(GrammarError::DuplicateLevel { level: entry.level });
            }
            if entry.operators.is_empty() {
                return Err(GrammarError::InvalidPrecedenceTable {
                    reason: format!("level {} lists no operators", entry.level),
                });
            }
            for operator in &entry.operators {
                if owners.insert(operator.as_str(), entry.level).is_some() {
                    return Err(GrammarError::DuplicateOperator {
                        operator: operator.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Parse and validate a table written as `[[level]]` arrays
    pub fn from_toml_str(content: &str) -> Result<Self, PrecedenceLoadError> {
        let table: PrecedenceTable = toml::from_str(content)?;
        table.validate()?;

        log_success!(
            codes::success::PRECEDENCE_TABLE_LOADED,
            "Precedence table loaded",
            "levels" => table.len()
        );
        Ok(table)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, PrecedenceLoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| PrecedenceLoadError::Io {
            path: path.to_path_buf(),
            source,
        });

        let result = content.and_then(|content| Self::from_toml_str(&content));
        if let Err(error) = &result {
            log_error!(error.error_code(), "Failed to load precedence table",
                "path" => path.display(),
                "error" => error
            );
        }
        result
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

#[derive(Debug, Error)]
pub enum PrecedenceLoadError {
    #[error("Failed to read precedence table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed precedence table: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] GrammarError),
}

impl PrecedenceLoadError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::Io { .. } | Self::Parse(_) => codes::precedence::TABLE_LOAD_FAILURE,
            Self::Invalid(error) => error.error_code(),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }
}
