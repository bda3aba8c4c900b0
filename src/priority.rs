//! Listener rule priority selection.
//!
//! ALB listener rules are evaluated in ascending priority order, with the
//! default rule always last. New rules take the lowest free priority so that
//! gaps left by deleted rules get reused.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::errors::{DeployError, Result};

const DEFAULT_PRIORITY: &str = "default";

/// A rule as returned by `elbv2 describe-rules`.
///
/// Only `Priority` and `IsDefault` are interpreted. Everything else is kept
/// as raw JSON so a rule list can be passed back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListenerRule {
    pub priority: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Value>,
}

impl ListenerRule {
    pub fn numbered(priority: u32) -> Self {
        Self {
            priority: priority.to_string(),
            is_default: false,
            rule_arn: None,
            conditions: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn default_rule() -> Self {
        Self {
            priority: DEFAULT_PRIORITY.to_string(),
            is_default: true,
            rule_arn: None,
            conditions: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Parsed priority. A rule flagged `IsDefault` is the default rule
    /// whatever its priority string says.
    pub fn rule_priority(&self) -> Result<RulePriority> {
        if self.is_default {
            return Ok(RulePriority::Default);
        }
        self.priority.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulePriority {
    Default,
    Numbered(u32),
}

impl FromStr for RulePriority {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        if s == DEFAULT_PRIORITY {
            return Ok(RulePriority::Default);
        }
        // u32 parsing accepts a leading '+', which is not a valid priority
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DeployError::InvalidPriority(s.to_string()));
        }
        match s.parse::<u32>() {
            Ok(n) if n > 0 => Ok(RulePriority::Numbered(n)),
            _ => Err(DeployError::InvalidPriority(s.to_string())),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RulesDocument {
    Envelope {
        #[serde(rename = "Rules")]
        rules: Vec<ListenerRule>,
    },
    Bare(Vec<ListenerRule>),
}

/// Decode a rule list, either a bare JSON array or the `{"Rules": [...]}`
/// object printed by `aws elbv2 describe-rules`.
pub fn parse_rules(json: &str) -> Result<Vec<ListenerRule>> {
    let doc: RulesDocument = serde_json::from_str(json)?;
    Ok(match doc {
        RulesDocument::Envelope { rules } => rules,
        RulesDocument::Bare(rules) => rules,
    })
}

/// Lowest positive priority not taken by a numbered rule.
///
/// Fails with [`DeployError::InvalidPriority`] if any non-default rule has a
/// priority that is not a positive base-10 integer.
pub fn get_priority(rules: &[ListenerRule]) -> Result<u32> {
    let mut taken = BTreeSet::new();
    for rule in rules {
        if let RulePriority::Numbered(n) = rule.rule_priority()? {
            taken.insert(n);
        }
    }

    // Taken values are sorted, so the first one that breaks the 1, 2, 3, ...
    // run marks the gap.
    let mut candidate = 1;
    for n in &taken {
        if *n != candidate {
            break;
        }
        candidate += 1;
    }

    tracing::debug!(
        priority = candidate,
        existing = taken.len(),
        "Selected listener rule priority"
    );
    Ok(candidate)
}
