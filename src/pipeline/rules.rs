// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cigraph contributors

//! Dependency rules
//!
//! A rule is a predicate over candidate step names. In a definition file a
//! bare string is a regular expression (unanchored, matched anywhere in the
//! name); the other syntaxes are spelled as single-key maps:
//!
//! ```yaml
//! depends_on:
//!   - "lint-.*"
//!   - glob: "test-*"
//!   - prefix: "deps-"
//!   - exact: checkout
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{CigraphError, CigraphResult};

/// A predicate matched against every step name in the pipeline
#[derive(Debug, Clone)]
pub enum DependencyRule {
    /// Regular expression, matched anywhere in the name
    Regex(Regex),
    /// Shell-style glob over the whole name
    Glob(glob::Pattern),
    /// Name starts with the given text
    Prefix(String),
    /// Name equals the given text
    Exact(String),
}

impl DependencyRule {
    /// Compile a regular expression rule
    pub fn regex(pattern: &str) -> CigraphResult<Self> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|e| CigraphError::InvalidRule {
                rule: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// Compile a glob rule
    pub fn glob(pattern: &str) -> CigraphResult<Self> {
        glob::Pattern::new(pattern)
            .map(Self::Glob)
            .map_err(|e| CigraphError::InvalidRule {
                rule: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    pub fn exact(name: impl Into<String>) -> Self {
        Self::Exact(name.into())
    }

    /// Test a candidate step name against this rule
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Regex(re) => re.is_match(name),
            Self::Glob(pattern) => pattern.matches(name),
            Self::Prefix(prefix) => name.starts_with(prefix.as_str()),
            Self::Exact(exact) => name == exact.as_str(),
        }
    }

    /// The rule text as authored
    pub fn source(&self) -> &str {
        match self {
            Self::Regex(re) => re.as_str(),
            Self::Glob(pattern) => pattern.as_str(),
            Self::Prefix(prefix) => prefix.as_str(),
            Self::Exact(exact) => exact.as_str(),
        }
    }

    /// Short name of the rule syntax
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Regex(_) => "regex",
            Self::Glob(_) => "glob",
            Self::Prefix(_) => "prefix",
            Self::Exact(_) => "exact",
        }
    }
}

impl fmt::Display for DependencyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex(re) => write!(f, "/{}/", re.as_str()),
            other => write!(f, "{}:{}", other.kind(), other.source()),
        }
    }
}

/// Wire shape of a rule in the definition file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRule {
    Bare(String),
    Regex { regex: String },
    Glob { glob: String },
    Prefix { prefix: String },
    Exact { exact: String },
}

impl TryFrom<RawRule> for DependencyRule {
    type Error = CigraphError;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        match raw {
            RawRule::Bare(regex) | RawRule::Regex { regex } => Self::regex(&regex),
            RawRule::Glob { glob } => Self::glob(&glob),
            RawRule::Prefix { prefix } => Ok(Self::prefix(prefix)),
            RawRule::Exact { exact } => Ok(Self::exact(exact)),
        }
    }
}

impl From<DependencyRule> for RawRule {
    fn from(rule: DependencyRule) -> Self {
        match rule {
            DependencyRule::Regex(re) => RawRule::Bare(re.as_str().to_string()),
            DependencyRule::Glob(pattern) => RawRule::Glob {
                glob: pattern.as_str().to_string(),
            },
            DependencyRule::Prefix(prefix) => RawRule::Prefix { prefix },
            DependencyRule::Exact(exact) => RawRule::Exact { exact },
        }
    }
}

impl Serialize for DependencyRule {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawRule::from(self.clone()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DependencyRule {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawRule::deserialize(deserializer)?;
        DependencyRule::try_from(raw).map_err(serde::de::Error::custom)
    }
}
