//! Level and category filtering for targets
//!
//! A [`MessageFilter`] accepts a message when its level is in the allowed
//! [`LevelSet`], its category matches one of the include patterns, and it
//! matches none of the exclude patterns. Empty sets and pattern lists allow
//! everything. Exclusion always wins over inclusion.

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::message::Message;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Set of allowed levels; the empty set allows every level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LevelSet(u8);

impl LevelSet {
    pub const fn empty() -> Self {
        LevelSet(0)
    }

    pub fn with(mut self, level: LogLevel) -> Self {
        self.insert(level);
        self
    }

    pub fn insert(&mut self, level: LogLevel) {
        self.0 |= level.bit();
    }

    pub fn contains(&self, level: LogLevel) -> bool {
        self.0 & level.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Whether a message at `level` passes this set
    #[inline]
    pub fn allows(&self, level: LogLevel) -> bool {
        self.is_empty() || self.contains(level)
    }

    pub fn iter(&self) -> impl Iterator<Item = LogLevel> + '_ {
        LogLevel::ALL.into_iter().filter(|l| self.contains(*l))
    }
}

impl FromIterator<LogLevel> for LevelSet {
    fn from_iter<I: IntoIterator<Item = LogLevel>>(iter: I) -> Self {
        iter.into_iter().fold(LevelSet::empty(), LevelSet::with)
    }
}

impl Serialize for LevelSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for LevelSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Vec::<LogLevel>::deserialize(deserializer)?.into_iter().collect())
    }
}

/// Category pattern: an exact category, or a prefix followed by a trailing `*`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategoryPattern {
    Exact(String),
    Prefix(String),
}

impl CategoryPattern {
    /// Parse a pattern. Empty patterns and `*` anywhere but the end are rejected.
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(LoggerError::pattern(pattern, "pattern is empty"));
        }
        match pattern.find('*') {
            None => Ok(CategoryPattern::Exact(pattern.to_string())),
            Some(pos) if pos == pattern.len() - 1 => {
                Ok(CategoryPattern::Prefix(pattern[..pos].to_string()))
            }
            Some(_) => Err(LoggerError::pattern(
                pattern,
                "wildcard '*' is only allowed as the last character",
            )),
        }
    }

    #[inline]
    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryPattern::Exact(exact) => category == exact,
            CategoryPattern::Prefix(prefix) => category.starts_with(prefix.as_str()),
        }
    }
}

impl fmt::Display for CategoryPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryPattern::Exact(exact) => write!(f, "{}", exact),
            CategoryPattern::Prefix(prefix) => write!(f, "{}*", prefix),
        }
    }
}

impl FromStr for CategoryPattern {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        CategoryPattern::parse(s)
    }
}

impl Serialize for CategoryPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CategoryPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CategoryPattern::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parse a list of textual patterns, failing on the first malformed one
pub fn parse_patterns<I, S>(patterns: I) -> Result<Vec<CategoryPattern>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|p| CategoryPattern::parse(p.as_ref()))
        .collect()
}

/// Level + category include/exclude filter owned by a target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFilter {
    #[serde(default)]
    pub levels: LevelSet,
    #[serde(default)]
    pub categories: Vec<CategoryPattern>,
    #[serde(default)]
    pub except: Vec<CategoryPattern>,
}

impl MessageFilter {
    /// Filter that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn levels(mut self, levels: impl IntoIterator<Item = LogLevel>) -> Self {
        self.levels = levels.into_iter().collect();
        self
    }

    #[must_use]
    pub fn categories(mut self, patterns: Vec<CategoryPattern>) -> Self {
        self.categories = patterns;
        self
    }

    #[must_use]
    pub fn except(mut self, patterns: Vec<CategoryPattern>) -> Self {
        self.except = patterns;
        self
    }

    /// Level check, then include patterns, then exclude patterns
    pub fn matches(&self, message: &Message) -> bool {
        if !self.levels.allows(message.level()) {
            return false;
        }
        self.matches_category(message.category())
    }

    pub fn matches_category(&self, category: &str) -> bool {
        let included =
            self.categories.is_empty() || self.categories.iter().any(|p| p.matches(category));
        included && !self.except.iter().any(|p| p.matches(category))
    }
}
