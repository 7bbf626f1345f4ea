//! Ensemble weighting of reviewer opinions
//!
//! ```text
//! opinions ──► sentiment compound ──► |score| ──► normalise ──► repeat ×max(1, ⌊w·10⌋)
//!                                                                      │
//!                                                   weighted text ◄────┘
//! ```
//!
//! The weighted text is what the summarizer sees. Only this arithmetic is
//! deterministic; sentiment and summarization are pluggable.

/// Added to the weight denominator so all-neutral opinions do not divide by zero.
pub const WEIGHT_EPSILON: f64 = 1e-6;

/// Scale applied to a normalised weight before flooring to a repeat count.
pub const REPETITION_SCALE: f64 = 10.0;

/// Signed sentiment signal for one opinion, conceptually in `[-1, 1]`.
pub trait SentimentScorer {
    fn compound(&self, text: &str) -> f64;
}

impl<F> SentimentScorer for F
where
    F: Fn(&str) -> f64,
{
    fn compound(&self, text: &str) -> f64 {
        self(text)
    }
}

/// Normalise absolute sentiment magnitudes so they sum to (almost) one.
pub fn sentiment_weights(scores: &[f64]) -> Vec<f64> {
    let magnitudes: Vec<f64> = scores.iter().map(|s| s.abs()).collect();
    let total: f64 = magnitudes.iter().sum::<f64>() + WEIGHT_EPSILON;
    magnitudes.iter().map(|m| m / total).collect()
}

/// Repeat count per opinion: `max(1, floor(weight * 10))`.
pub fn repetition_counts(weights: &[f64]) -> Vec<usize> {
    weights
        .iter()
        .map(|w| ((w * REPETITION_SCALE).floor() as usize).max(1))
        .collect()
}

/// Repeat each opinion back to back by its count and join opinions with a space.
pub fn weighted_concatenation(opinions: &[String], counts: &[usize]) -> String {
    opinions
        .iter()
        .zip(counts)
        .map(|(opinion, count)| opinion.repeat(*count))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Score, weight and concatenate opinions in one pass.
pub fn weighted_text<S: SentimentScorer + ?Sized>(opinions: &[String], scorer: &S) -> String {
    let scores: Vec<f64> = opinions.iter().map(|o| scorer.compound(o)).collect();
    let counts = repetition_counts(&sentiment_weights(&scores));
    weighted_concatenation(opinions, &counts)
}

/// Normalisation constant of the compound score.
const COMPOUND_ALPHA: f64 = 15.0;

/// Tokens that flip the valence of the next few words.
const NEGATIONS: &[&str] = &[
    "not", "no", "never", "without", "hardly", "isn't", "doesn't", "don't", "cannot", "lacks",
];

const NEGATION_WINDOW: usize = 3;

/// Review-oriented valence lexicon.
const LEXICON: &[(&str, f64)] = &[
    ("accept", 1.6),
    ("appreciate", 1.8),
    ("bad", -2.5),
    ("clear", 1.6),
    ("compelling", 2.2),
    ("concern", -1.4),
    ("concerns", -1.4),
    ("confusing", -1.6),
    ("convincing", 1.9),
    ("excellent", 3.2),
    ("fail", -2.3),
    ("fails", -2.3),
    ("flawed", -2.0),
    ("good", 1.9),
    ("great", 3.1),
    ("impressive", 2.6),
    ("inadequate", -1.7),
    ("incorrect", -1.9),
    ("insufficient", -1.6),
    ("interesting", 1.7),
    ("issue", -1.0),
    ("issues", -1.0),
    ("limited", -0.9),
    ("missing", -1.2),
    ("nice", 1.8),
    ("novel", 1.5),
    ("ok", 0.9),
    ("okay", 0.9),
    ("poor", -2.1),
    ("poorly", -2.1),
    ("problem", -1.7),
    ("problems", -1.7),
    ("reject", -1.7),
    ("solid", 1.6),
    ("strong", 2.3),
    ("terrible", -3.4),
    ("unclear", -1.5),
    ("useful", 1.9),
    ("vague", -1.3),
    ("weak", -1.9),
    ("well", 1.1),
    ("wrong", -2.1),
];

/// Lexicon-based compound scorer in the style of VADER.
///
/// Sums word valences (negated within a short window after a negation word)
/// and squashes the sum with `x / sqrt(x² + 15)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconSentiment;

impl LexiconSentiment {
    fn valence(word: &str) -> Option<f64> {
        LEXICON
            .binary_search_by(|(w, _)| (*w).cmp(word))
            .ok()
            .map(|idx| LEXICON[idx].1)
    }
}

impl SentimentScorer for LexiconSentiment {
    fn compound(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
            .collect();

        let mut sum = 0.0;
        let mut negate_left = 0usize;
        for token in tokens {
            if NEGATIONS.contains(&token) {
                negate_left = NEGATION_WINDOW;
                continue;
            }
            if let Some(valence) = Self::valence(token) {
                sum += if negate_left > 0 { -0.74 * valence } else { valence };
            }
            negate_left = negate_left.saturating_sub(1);
        }

        if sum == 0.0 {
            return 0.0;
        }
        (sum / (sum * sum + COMPOUND_ALPHA).sqrt()).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_normalise_magnitudes() {
        let weights = sentiment_weights(&[0.3, -0.9, 0.0]);
        assert!((weights[0] - 0.25).abs() < 1e-5);
        assert!((weights[1] - 0.75).abs() < 1e-5);
        assert_eq!(weights[2], 0.0);
    }

    #[test]
    fn test_repetition_counts_floor_of_one() {
        let weights = sentiment_weights(&[0.3, 0.9, 0.0]);
        assert_eq!(repetition_counts(&weights), vec![2, 7, 1]);
    }

    #[test]
    fn test_all_neutral_does_not_divide_by_zero() {
        let weights = sentiment_weights(&[0.0, 0.0]);
        assert_eq!(weights, vec![0.0, 0.0]);
        assert_eq!(repetition_counts(&weights), vec![1, 1]);
    }

    #[test]
    fn test_single_opinion_saturates() {
        let weights = sentiment_weights(&[0.8]);
        assert_eq!(repetition_counts(&weights), vec![9]);
    }

    #[test]
    fn test_weighted_concatenation_layout() {
        let opinions = vec!["bad".to_string(), "terrible".to_string(), "ok".to_string()];
        let text = weighted_concatenation(&opinions, &[2, 1, 1]);
        assert_eq!(text, "badbad terrible ok");
    }

    #[test]
    fn test_weighted_text_with_closure_scorer() {
        let opinions = vec!["bad".to_string(), "terrible".to_string(), "ok".to_string()];
        let scorer = |text: &str| match text {
            "bad" => 0.3,
            "terrible" => -0.9,
            _ => 0.0,
        };
        let text = weighted_text(&opinions, &scorer);
        assert_eq!(text, format!("badbad {} ok", "terrible".repeat(7)));
    }

    #[test]
    fn test_lexicon_is_sorted_for_lookup() {
        assert!(LEXICON.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_lexicon_sentiment_polarity() {
        let scorer = LexiconSentiment;
        assert!(scorer.compound("This is an excellent and clear paper.") > 0.5);
        assert!(scorer.compound("Terrible, flawed and unclear.") < -0.5);
        assert_eq!(scorer.compound("The section describes a model."), 0.0);
        assert!(scorer.compound("The method is not good.") < 0.0);
    }

    #[test]
    fn test_lexicon_sentiment_bounded() {
        let text = "excellent ".repeat(100);
        let score = LexiconSentiment.compound(&text);
        assert!(score <= 1.0 && score > 0.99);
    }
}
