use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const HIGH_PENALTY: u32 = 10;
const MEDIUM_PENALTY: u32 = 5;
const LOW_PENALTY: u32 = 2;
const UNKNOWN_PENALTY: u32 = 2;

/// Curated high-risk additives (colourings, nitrites, phosphates, sweeteners...)
const CURATED_HIGH_RISK: &[&str] = &[
    "en:e102", // Tartrazine
    "en:e110",
    "en:e120",
    "en:e124",
    "en:e129",
    "en:e150c",
    "en:e150d",
    "en:e171", // Titanium dioxide
    "en:e249",
    "en:e250",
    "en:e251",
    "en:e252",
    "en:e320",
    "en:e321",
    "en:e338",
    "en:e339",
    "en:e340",
    "en:e341",
    "en:e407",
    "en:e450",
    "en:e451",
    "en:e452",
    "en:e627",
    "en:e631",
    "en:e632",
    "en:e950",
    "en:e951",
    "en:e952",
    "en:e954",
];

/// Curated medium-risk additives. e249 and e340 also appear in the high-risk
/// table and resolve to high.
const CURATED_MEDIUM_RISK: &[&str] = &[
    "en:e1201",
    "en:e1202",
    "en:e249",
    "en:e415",
    "en:e466",
    "en:e340",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
    /// No risk taxonomy was available to classify the tag
    Unknown,
}

impl Severity {
    pub fn penalty(self) -> u32 {
        match self {
            Severity::High => HIGH_PENALTY,
            Severity::Medium => MEDIUM_PENALTY,
            Severity::Low => LOW_PENALTY,
            Severity::Unknown => UNKNOWN_PENALTY,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaggedAdditive {
    pub tag: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditiveScore {
    /// 0-100
    pub score: u8,
    pub penalty: u32,
    /// Every input tag, in input order
    pub flagged_additives: Vec<FlaggedAdditive>,
}

impl AdditiveScore {
    /// The best case: no additives at all
    pub fn clean() -> Self {
        Self {
            score: 100,
            penalty: 0,
            flagged_additives: Vec::new(),
        }
    }
}

/// Risk membership sets, compared after trimming and lowercasing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskTables {
    high_risk: HashSet<String>,
    medium_risk: HashSet<String>,
}

impl RiskTables {
    pub fn new<H, M, S>(high_risk: H, medium_risk: M) -> Self
    where
        H: IntoIterator<Item = S>,
        M: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            high_risk: high_risk.into_iter().map(|t| normalize_tag(t.as_ref())).collect(),
            medium_risk: medium_risk.into_iter().map(|t| normalize_tag(t.as_ref())).collect(),
        }
    }

    /// The built-in tables shipped with the tool
    pub fn curated() -> Self {
        Self::new(CURATED_HIGH_RISK.iter(), CURATED_MEDIUM_RISK.iter())
    }

    pub fn curated_high_risk() -> Vec<String> {
        CURATED_HIGH_RISK.iter().map(|t| t.to_string()).collect()
    }

    pub fn curated_medium_risk() -> Vec<String> {
        CURATED_MEDIUM_RISK.iter().map(|t| t.to_string()).collect()
    }

    /// High is checked before medium; anything else is low.
    pub fn classify(&self, tag: &str) -> Severity {
        let tag = normalize_tag(tag);
        if self.high_risk.contains(&tag) {
            Severity::High
        } else if self.medium_risk.contains(&tag) {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// How additive tags are classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdditivePolicy {
    Tiered(RiskTables),
    /// Degraded mode for when no risk taxonomy is configured: every tag is
    /// `Unknown` and costs the same.
    Flat,
}

#[derive(Debug, Clone)]
pub struct AdditiveScorer {
    policy: AdditivePolicy,
}

impl AdditiveScorer {
    pub fn new(policy: AdditivePolicy) -> Self {
        Self { policy }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self.policy, AdditivePolicy::Flat)
    }

    pub fn classify(&self, tag: &str) -> Severity {
        match &self.policy {
            AdditivePolicy::Tiered(tables) => tables.classify(tag),
            AdditivePolicy::Flat => Severity::Unknown,
        }
    }

    /// Score a list of additive tags. Repeated tags are penalized each time.
    pub fn score(&self, tags: &[String]) -> AdditiveScore {
        if tags.is_empty() {
            return AdditiveScore::clean();
        }

        let flagged_additives: Vec<FlaggedAdditive> = tags
            .iter()
            .map(|tag| FlaggedAdditive {
                tag: tag.clone(),
                severity: self.classify(tag),
            })
            .collect();

        let penalty: u32 = flagged_additives.iter().map(|a| a.severity.penalty()).sum();
        let score = 100u32.saturating_sub(penalty) as u8;

        AdditiveScore {
            score,
            penalty,
            flagged_additives,
        }
    }
}

impl Default for AdditiveScorer {
    fn default() -> Self {
        Self::new(AdditivePolicy::Tiered(RiskTables::curated()))
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_no_additives_is_best_case() {
        let result = AdditiveScorer::default().score(&[]);
        assert_eq!(result, AdditiveScore::clean());
        assert_eq!(result.score, 100);
        assert_eq!(result.penalty, 0);
    }

    #[test]
    fn test_tiered_penalties() {
        let scorer = AdditiveScorer::default();
        let result = scorer.score(&tags(&["en:e171", "en:e415", "en:e330"]));

        assert_eq!(result.penalty, 10 + 5 + 2);
        assert_eq!(result.score, 83);
        let severities: Vec<Severity> = result.flagged_additives.iter().map(|a| a.severity).collect();
        assert_eq!(severities, vec![Severity::High, Severity::Medium, Severity::Low]);
    }

    #[test]
    fn test_high_risk_wins_over_medium() {
        // en:e249 is listed in both curated tables
        let scorer = AdditiveScorer::default();
        assert_eq!(scorer.classify("en:e249"), Severity::High);
        assert_eq!(scorer.classify("en:e340"), Severity::High);
    }

    #[test]
    fn test_duplicates_counted_independently() {
        let scorer = AdditiveScorer::default();
        let result = scorer.score(&tags(&["en:e171", "en:e171", "en:e171"]));
        assert_eq!(result.penalty, 30);
        assert_eq!(result.flagged_additives.len(), 3);
    }

    #[test]
    fn test_order_preserved_and_nothing_dropped() {
        let input = tags(&["en:e330", "en:e102", "en:e1202", "mystery"]);
        let result = AdditiveScorer::default().score(&input);

        let out: Vec<&str> = result.flagged_additives.iter().map(|a| a.tag.as_str()).collect();
        assert_eq!(out, vec!["en:e330", "en:e102", "en:e1202", "mystery"]);
    }

    #[test]
    fn test_score_floors_at_zero() {
        let input = vec!["en:e171".to_string(); 15];
        let result = AdditiveScorer::default().score(&input);
        assert_eq!(result.penalty, 150);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_classification_ignores_case_and_whitespace() {
        let scorer = AdditiveScorer::default();
        assert_eq!(scorer.classify(" EN:E171 "), Severity::High);
    }

    #[test]
    fn test_injected_tables() {
        let tables = RiskTables::new(["x:bad"], ["x:meh"]);
        let scorer = AdditiveScorer::new(AdditivePolicy::Tiered(tables));

        assert_eq!(scorer.classify("x:bad"), Severity::High);
        assert_eq!(scorer.classify("x:meh"), Severity::Medium);
        // Not in the injected tables, even though it is curated
        assert_eq!(scorer.classify("en:e171"), Severity::Low);
    }

    #[test]
    fn test_flat_policy() {
        let scorer = AdditiveScorer::new(AdditivePolicy::Flat);
        let result = scorer.score(&tags(&["en:e171", "en:e330"]));

        assert!(scorer.is_flat());
        assert_eq!(result.penalty, 4);
        assert_eq!(result.score, 96);
        assert!(result
            .flagged_additives
            .iter()
            .all(|a| a.severity == Severity::Unknown));
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }
}
