//! Section scores and paper verdicts.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::checkpoint::types::{KEY_REVIEWERS, KEY_SECTION_REVIEWS};
use crate::decision::extract_decision;

use super::config::{ScoringConfig, VerdictPolicy};
use super::{ScoringError, ScoringResult};

/// Cutoffs of the four-tier policy: Accept, Minor Revisions, Major Revisions.
pub const FOUR_TIER_CUTOFFS: (f64, f64, f64) = (85.0, 70.0, 50.0);

/// Final paper verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Verdict {
    Accept,
    MinorRevisions,
    MajorRevisions,
    Reject,
}

impl Verdict {
    pub fn is_accept(self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accept => write!(f, "Accept"),
            Verdict::MinorRevisions => write!(f, "Minor Revisions"),
            Verdict::MajorRevisions => write!(f, "Major Revisions"),
            Verdict::Reject => write!(f, "Reject"),
        }
    }
}

impl VerdictPolicy {
    /// Map a final score to a verdict. Every boundary is inclusive.
    pub fn verdict(self, score: f64, accept_threshold: f64) -> Verdict {
        match self {
            VerdictPolicy::Threshold if score >= accept_threshold => Verdict::Accept,
            VerdictPolicy::Threshold => Verdict::Reject,
            VerdictPolicy::FourTier => {
                let (accept, minor, major) = FOUR_TIER_CUTOFFS;
                if score >= accept {
                    Verdict::Accept
                } else if score >= minor {
                    Verdict::MinorRevisions
                } else if score >= major {
                    Verdict::MajorRevisions
                } else {
                    Verdict::Reject
                }
            }
        }
    }
}

/// Drop components explicitly switched off. Unknown keys are kept.
pub fn filter_components(record: &Value, config: &ScoringConfig) -> Value {
    match record {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| config.includes(key))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        ),
        other => other.clone(),
    }
}

/// Score one (already filtered) section record in `[0, 100]`.
///
/// 1. mean decision score of the active reviewers, if any decided;
/// 2. otherwise the first numeric field within `[0, 100]`;
/// 3. otherwise the decision extracted from the whole record, or 0.
pub fn extract_score(record: &Value, config: &ScoringConfig) -> f64 {
    if let Some(Value::Object(reviewers)) = record.get(KEY_REVIEWERS) {
        let scores: Vec<f64> = reviewers
            .iter()
            .filter(|(name, _)| config.reviewer_active(name))
            .filter_map(|(_, opinion)| extract_decision(opinion, config.fallback_to_reject))
            .map(|d| config.decision_scores.score(d))
            .collect();
        if !scores.is_empty() {
            return scores.iter().sum::<f64>() / scores.len() as f64;
        }
    }

    if let Value::Object(map) = record {
        let numeric = map
            .values()
            .filter_map(Value::as_f64)
            .find(|n| (0.0..=100.0).contains(n));
        if let Some(score) = numeric {
            return score;
        }
    }

    extract_decision(record, config.fallback_to_reject)
        .map(|d| config.decision_scores.score(d))
        .unwrap_or(0.0)
}

/// Combine section scores into a final score and verdict.
///
/// Weighted: `Σ(score · w) / Σw` with every section weighted by
/// `section_weight`. Unweighted: plain mean. No sections score 0.
pub fn final_verdict(scores: &[f64], config: &ScoringConfig) -> (f64, Verdict) {
    let final_score = if config.use_weighted_avg {
        let weight = config.section_weight;
        let total_weight = weight * scores.len() as f64;
        if total_weight > 0.0 {
            scores.iter().map(|s| s * weight).sum::<f64>() / total_weight
        } else {
            0.0
        }
    } else if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    let verdict = config
        .verdict_policy
        .verdict(final_score, config.accept_threshold);
    (final_score, verdict)
}

/// Scored paper under one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperScore {
    /// Section key → score, in checkpoint order.
    pub section_scores: Vec<(String, f64)>,
    pub final_score: f64,
    pub verdict: Verdict,
}

/// Score every entry of a checkpoint's `Section Reviews`.
pub fn score_paper(checkpoint: &Value, config: &ScoringConfig) -> ScoringResult<PaperScore> {
    let reviews = checkpoint
        .get(KEY_SECTION_REVIEWS)
        .and_then(Value::as_object)
        .ok_or(ScoringError::MissingSectionReviews)?;

    let section_scores: Vec<(String, f64)> = reviews
        .iter()
        .map(|(section, record)| {
            let filtered = filter_components(record, config);
            (section.clone(), extract_score(&filtered, config))
        })
        .collect();

    let scores: Vec<f64> = section_scores.iter().map(|(_, s)| *s).collect();
    let (final_score, verdict) = final_verdict(&scores, config);
    Ok(PaperScore {
        section_scores,
        final_score,
        verdict,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::types::{KEY_QUESTIONER, KEY_TEST};
    use serde_json::json;

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let config = ScoringConfig::default();
        let (score, verdict) = final_verdict(&[100.0, 0.0], &config);
        assert_eq!(score, 50.0);
        assert_eq!(verdict, Verdict::Accept);

        let strict = ScoringConfig::builder().accept_threshold(50.1).build();
        assert_eq!(final_verdict(&[100.0, 0.0], &strict).1, Verdict::Reject);
    }

    #[test]
    fn test_unweighted_and_empty() {
        let config = ScoringConfig::builder().use_weighted_avg(false).build();
        assert_eq!(final_verdict(&[90.0, 30.0, 60.0], &config).0, 60.0);
        assert_eq!(final_verdict(&[], &config), (0.0, Verdict::Reject));
        assert_eq!(final_verdict(&[], &ScoringConfig::default()).0, 0.0);
    }

    #[test]
    fn test_four_tier_policy() {
        let policy = VerdictPolicy::FourTier;
        assert_eq!(policy.verdict(85.0, 50.0), Verdict::Accept);
        assert_eq!(policy.verdict(84.9, 50.0), Verdict::MinorRevisions);
        assert_eq!(policy.verdict(70.0, 50.0), Verdict::MinorRevisions);
        assert_eq!(policy.verdict(50.0, 50.0), Verdict::MajorRevisions);
        assert_eq!(policy.verdict(49.0, 50.0), Verdict::Reject);
        assert_eq!(Verdict::MinorRevisions.to_string(), "Minor Revisions");
    }

    #[test]
    fn test_reviewer_mean_with_active_subset() {
        let record = json!({
            "Reviewers": {
                "mistral": "I accept.",
                "llama3.2": "Reject.",
                "other": "Accept"
            }
        });
        let config = ScoringConfig::default();
        assert_eq!(extract_score(&record, &config), 50.0);

        let only = ScoringConfig::builder().active_reviewers(["mistral"]).build();
        assert_eq!(extract_score(&record, &only), 100.0);

        let all = ScoringConfig::builder().all_reviewers().build();
        assert!((extract_score(&record, &all) - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_null_reviewer_counts_as_reject_only_with_fallback() {
        let record = json!({"Reviewers": {"mistral": "Accept", "qwen2.5": null}});
        assert_eq!(extract_score(&record, &ScoringConfig::default()), 50.0);
        let no_fallback = ScoringConfig::builder().fallback_to_reject(false).build();
        assert_eq!(extract_score(&record, &no_fallback), 100.0);
    }

    #[test]
    fn test_no_surviving_reviewers_falls_through() {
        let record = json!({
            "Test": "Looks fine, accept",
            "Reviewers": {"gpt": "Reject"}
        });
        assert_eq!(extract_score(&record, &ScoringConfig::default()), 100.0);
    }

    #[test]
    fn test_numeric_field_override() {
        let record = json!({"Note": "reject", "Score": 72, "Other": 5});
        assert_eq!(extract_score(&record, &ScoringConfig::default()), 72.0);
        let out_of_range = json!({"Score": 150, "Note": "accept"});
        assert_eq!(extract_score(&out_of_range, &ScoringConfig::default()), 100.0);
    }

    #[test]
    fn test_bool_is_not_numeric() {
        let desk = json!({"Review": "Relevant", "Accept": true});
        assert_eq!(extract_score(&desk, &ScoringConfig::default()), 100.0);
    }

    #[test]
    fn test_ambiguous_without_fallback_scores_zero() {
        let config = ScoringConfig::builder().fallback_to_reject(false).build();
        assert_eq!(extract_score(&json!({"Test": "acceptable"}), &config), 0.0);
    }

    #[test]
    fn test_filter_components_only_drops_explicit_false() {
        let record = json!({"Test": "a", "Questioner": "q?", "Custom": "c"});
        let filtered = filter_components(&record, &ScoringConfig::default());
        assert!(filtered.get(KEY_TEST).is_some());
        assert!(filtered.get(KEY_QUESTIONER).is_none());
        assert!(filtered.get("Custom").is_some());
    }

    #[test]
    fn test_score_paper_requires_section_reviews() {
        assert!(matches!(
            score_paper(&json!({"Available Sections": []}), &ScoringConfig::default()),
            Err(ScoringError::MissingSectionReviews)
        ));
    }

    #[test]
    fn test_score_paper_end_to_end() {
        let checkpoint = json!({
            "Section Reviews": {
                "DeskReviewer": {"Review": "Relevant", "Accept": true},
                "Abstract": {
                    "Test": "fine",
                    "Reviewers": {"mistral": "Reject", "llama3.2": "Reject"},
                    "Questioner": "Why accept?"
                }
            }
        });
        let paper = score_paper(&checkpoint, &ScoringConfig::default()).unwrap();
        assert_eq!(
            paper.section_scores,
            vec![("DeskReviewer".to_string(), 100.0), ("Abstract".to_string(), 0.0)]
        );
        assert_eq!(paper.final_score, 50.0);
        assert_eq!(paper.verdict, Verdict::Accept);
    }
}
