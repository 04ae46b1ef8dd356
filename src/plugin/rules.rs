//! Glob-based filename rules supplied through configuration

use super::ClassifierPlugin;
use crate::error::{Error, Result};
use crate::model::FileDescriptor;
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Rules run ahead of the built-in table lookups unless configured otherwise
const RULE_PRIORITY: i32 = 5;

/// A single `pattern -> category` rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilenameRule {
    /// Glob matched against the file name, case-insensitively
    pub pattern: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl FilenameRule {
    pub fn new(pattern: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            category: category.into(),
            priority: None,
        }
    }
}

/// Applies filename rules in order; the first matching rule wins
#[derive(Debug, Clone)]
pub struct RulePlugin {
    name: String,
    rules: Vec<(Pattern, String)>,
    priority: i32,
}

impl RulePlugin {
    /// One plugin per distinct rule priority, keeping rule order within each
    pub fn grouped(rules: &[FilenameRule]) -> Result<Vec<Self>> {
        let mut groups: BTreeMap<Option<i32>, Vec<FilenameRule>> = BTreeMap::new();
        for rule in rules {
            groups.entry(rule.priority).or_default().push(rule.clone());
        }
        groups
            .into_iter()
            .map(|(priority, rules)| Self::new(&rules, priority))
            .collect()
    }

    /// Build from rules sharing one priority (default 5)
    pub fn new(rules: &[FilenameRule], priority: Option<i32>) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                Pattern::new(&rule.pattern)
                    .map(|p| (p, rule.category.clone()))
                    .map_err(|source| Error::InvalidPattern {
                        pattern: rule.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let name = match priority {
            Some(p) => format!("rule_categoriser_p{}", p),
            None => "rule_categoriser".to_string(),
        };

        Ok(Self {
            name,
            rules,
            priority: priority.unwrap_or(RULE_PRIORITY),
        })
    }
}

impl ClassifierPlugin for RulePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Categorises files by configured filename patterns"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn can_handle(&self, _file: &FileDescriptor) -> bool {
        !self.rules.is_empty()
    }

    fn classify(&self, file: &FileDescriptor) -> anyhow::Result<Option<String>> {
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::new()
        };
        Ok(self
            .rules
            .iter()
            .find(|(pattern, _)| pattern.matches_with(&file.name, options))
            .map(|(_, category)| category.clone()))
    }

    fn declared_categories(&self) -> BTreeSet<String> {
        self.rules.iter().map(|(_, c)| c.clone()).collect()
    }
}
