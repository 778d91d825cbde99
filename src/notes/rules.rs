//! Classification rules: `{title, rule}` pairs that sort commits into sections.
//!
//! `rule` is a regular expression tested anywhere in the commit message
//! (case-sensitive). The defaults look like literal prefixes (`feat:`) but are
//! still compiled as regexes, so rule authors can write `^feat(\(.+\))?:` too.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A user-supplied rule as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub title: String,
    pub rule: String,
}

impl ClassificationRule {
    pub fn new(title: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rule: rule.into(),
        }
    }
}

/// The rules used when none are configured.
pub fn default_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule::new("Features", "feat:"),
        ClassificationRule::new("Performance", "perf:"),
        ClassificationRule::new("Bug Fixes", "fix:"),
    ]
}

/// A rule whose pattern has been validated and compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub title: String,
    pub rule: String,
    pattern: Regex,
}

impl CompiledRule {
    /// Whether the rule's pattern occurs anywhere in `message`.
    pub fn is_match(&self, message: &str) -> bool {
        self.pattern.is_match(message)
    }

    /// The note text for a matching `message`.
    ///
    /// Everything up to and including the first occurrence of the rule text is
    /// removed. When the rule text never occurs literally (a regex rule), the
    /// message is cut after the first pattern match instead.
    pub fn note_text(&self, message: &str) -> String {
        let rest = match message.find(&self.rule) {
            Some(pos) => &message[pos + self.rule.len()..],
            None => match self.pattern.find(message) {
                Some(m) => &message[m.end()..],
                None => message,
            },
        };
        rest.trim().to_string()
    }
}

/// An ordered, validated set of rules. Order decides section order.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile `rules`, failing on the first invalid pattern.
    pub fn compile(rules: Vec<ClassificationRule>) -> Result<Self, ConfigError> {
        let rules = rules
            .into_iter()
            .enumerate()
            .map(|(index, ClassificationRule { title, rule })| {
                if rule.is_empty() {
                    return Err(ConfigError::EmptyRulePattern { index });
                }
                let pattern = Regex::new(&rule).map_err(|source| ConfigError::InvalidRulePattern {
                    index,
                    title: title.clone(),
                    rule: rule.clone(),
                    source,
                })?;
                Ok(CompiledRule {
                    title,
                    rule,
                    pattern,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    /// Parse a JSON array of `{title, rule}` objects.
    ///
    /// Blank input selects [`default_rules`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        if json.trim().is_empty() {
            return Ok(Self::defaults());
        }
        let rules: Vec<ClassificationRule> =
            serde_json::from_str(json).map_err(ConfigError::InvalidRuleList)?;
        Self::compile(rules)
    }

    pub fn defaults() -> Self {
        Self::compile(default_rules()).expect("default rules are valid patterns")
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_order() {
        let rules = RuleSet::defaults();
        let titles: Vec<&str> = rules.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Features", "Performance", "Bug Fixes"]);
    }

    #[test]
    fn test_from_json() {
        let rules = RuleSet::from_json(r#"[{"title": "Docs", "rule": "docs:"}]"#).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.iter().next().unwrap().title, "Docs");
    }

    #[test]
    fn test_blank_json_uses_defaults() {
        assert_eq!(RuleSet::from_json("  ").unwrap().len(), 3);
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = RuleSet::from_json(r#"[{"title": "Docs"}]"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRuleList(_)));
    }

    #[test]
    fn test_invalid_pattern_fails_fast() {
        let err = RuleSet::compile(vec![
            ClassificationRule::new("Features", "feat:"),
            ClassificationRule::new("Broken", "fix(:"),
        ])
        .unwrap_err();

        match err {
            ConfigError::InvalidRulePattern { index, title, .. } => {
                assert_eq!(index, 1);
                assert_eq!(title, "Broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let err = RuleSet::compile(vec![ClassificationRule::new("All", "")]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyRulePattern { index: 0 }));
    }

    #[test]
    fn test_match_is_case_sensitive_and_unanchored() {
        let rules = RuleSet::defaults();
        let feat = rules.iter().next().unwrap();
        assert!(feat.is_match("feat: add login"));
        assert!(feat.is_match("Merge: feat: add login"));
        assert!(!feat.is_match("Feat: add login"));
    }

    #[test]
    fn test_note_text_strips_rule_literal() {
        let rules = RuleSet::defaults();
        let feat = rules.iter().next().unwrap();
        assert_eq!(feat.note_text("feat: add login"), "add login");
        assert_eq!(feat.note_text("  feat:   spaced out  \n"), "spaced out");
    }

    #[test]
    fn test_note_text_regex_rule() {
        let rules =
            RuleSet::compile(vec![ClassificationRule::new("Features", r"^feat(\(\w+\))?:")]).unwrap();
        let rule = rules.iter().next().unwrap();
        assert!(rule.is_match("feat(auth): add login"));
        assert_eq!(rule.note_text("feat(auth): add login"), "add login");
    }
}
