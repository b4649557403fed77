use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::Level;

/// Keywords that signal a difficulty level
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevelRule {
    pub level: Level,
    pub keywords: Vec<String>,
}

/// Rule tables driving the classifier.
///
/// Level rules are checked in order and the first rule with a keyword present
/// in the text wins. Topic aliases map an extra keyword onto a path topic
/// (`ml -> machine learning`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassifierRules {
    level_rules: Vec<LevelRule>,
    topic_aliases: Vec<(String, String)>,
}

impl ClassifierRules {
    /// Create rules with the default level keyword groups and no aliases
    pub fn new() -> Self {
        let mut rules = Self::empty();
        rules.load_default_level_rules();
        rules
    }

    /// Rules with no level keywords and no aliases
    pub fn empty() -> Self {
        Self {
            level_rules: Vec::new(),
            topic_aliases: Vec::new(),
        }
    }

    /// Load default rules extended by a rules file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        let mut rules = Self::new();
        rules.parse_rules_file(&content);
        info!("📚 Loaded classifier rules from: {}", path.as_ref().display());
        Ok(rules)
    }

    pub fn level_rules(&self) -> &[LevelRule] {
        &self.level_rules
    }

    pub fn topic_aliases(&self) -> &[(String, String)] {
        &self.topic_aliases
    }

    /// Add a keyword to a level, creating the rule at the end of the table if missing
    pub fn add_level_keyword(&mut self, level: Level, keyword: &str) {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return;
        }

        match self.level_rules.iter_mut().find(|rule| rule.level == level) {
            Some(rule) => {
                if !rule.keywords.contains(&keyword) {
                    rule.keywords.push(keyword);
                }
            }
            None => self.level_rules.push(LevelRule {
                level,
                keywords: vec![keyword],
            }),
        }
    }

    /// Add an alias keyword for a topic
    pub fn add_topic_alias(&mut self, alias: &str, topic: &str) {
        let alias = alias.trim().to_lowercase();
        let topic = topic.trim().to_string();
        if alias.is_empty() || topic.is_empty() {
            return;
        }
        self.topic_aliases.push((alias, topic));
    }

    /// First level whose keywords appear in already lower-cased text
    pub fn infer_level(&self, text: &str) -> Option<Level> {
        self.level_rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|kw| text.contains(kw.as_str())))
            .map(|rule| rule.level)
    }

    /// Topics reachable through aliases found in already lower-cased text
    pub fn aliased_topics<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.topic_aliases
            .iter()
            .filter(move |(alias, _)| text.contains(alias.as_str()))
            .map(|(_, topic)| topic.as_str())
    }

    fn load_default_level_rules(&mut self) {
        let defaults: [(Level, &[&str]); 3] = [
            (Level::Advanced, &["advanced", "expert"]),
            (Level::Intermediate, &["intermediate", "project", "implementation"]),
            (Level::Beginner, &["beginner", "basics", "introduction"]),
        ];

        for (level, keywords) in defaults {
            self.level_rules.push(LevelRule {
                level,
                keywords: keywords.iter().map(|kw| kw.to_string()).collect(),
            });
        }
    }

    /// Parse a rules file.
    ///
    /// ```text
    /// [advanced]
    /// deep dive
    /// [topics]
    /// ml -> machine learning
    /// ```
    fn parse_rules_file(&mut self, content: &str) {
        let mut section: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                section = Some(line[1..line.len() - 1].trim().to_lowercase());
                continue;
            }

            match section.as_deref() {
                Some("topics") => match line.split_once(" -> ") {
                    Some((alias, topic)) => self.add_topic_alias(alias, topic),
                    None => warn!("Ignoring malformed topic alias: {}", line),
                },
                Some(name) => match name.parse::<Level>() {
                    Ok(level) => self.add_level_keyword(level, line),
                    Err(_) => warn!("Ignoring rule in unknown section [{}]: {}", name, line),
                },
                None => warn!("Ignoring rule outside of a section: {}", line),
            }
        }
    }

    /// Get statistics about the rule tables
    pub fn get_stats(&self) -> RuleStats {
        RuleStats {
            level_keywords: self
                .level_rules
                .iter()
                .map(|rule| (rule.level, rule.keywords.len()))
                .collect(),
            topic_aliases: self.topic_aliases.len(),
        }
    }
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the classifier rules
#[derive(Debug, Clone)]
pub struct RuleStats {
    pub level_keywords: HashMap<Level, usize>,
    pub topic_aliases: usize,
}
