//! Bounded rejection sampling of non-conflicted reviewers.

use rand::Rng;
use tracing::debug;

use super::identity::ReviewerIdentity;
use super::{PanelError, PanelResult};

/// Default cap on draws before sampling gives up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 1000;

/// Draws random identities until enough non-conflicted ones are found.
#[derive(Debug, Clone, Copy)]
pub struct PanelSampler {
    max_attempts: usize,
}

impl Default for PanelSampler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl PanelSampler {
    pub fn new(max_attempts: usize) -> Self {
        Self { max_attempts }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Sample `count` identities with no conflict of interest.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
    ) -> PanelResult<Vec<ReviewerIdentity>> {
        self.sample_with(count, || ReviewerIdentity::random(&mut *rng))
    }

    /// Like [`sample`](Self::sample) with a caller-supplied draw.
    pub fn sample_with<F>(&self, count: usize, mut draw: F) -> PanelResult<Vec<ReviewerIdentity>>
    where
        F: FnMut() -> ReviewerIdentity,
    {
        let mut panel = Vec::with_capacity(count);
        let mut attempts = 0;

        while panel.len() < count {
            if attempts >= self.max_attempts {
                return Err(PanelError::SamplingExhausted {
                    wanted: count,
                    found: panel.len(),
                    attempts,
                });
            }
            attempts += 1;

            let candidate = draw();
            if candidate.is_conflicted() {
                debug!(
                    name = candidate.name(),
                    conflict = %candidate.conflict(),
                    "Discarding conflicted reviewer"
                );
                continue;
            }
            panel.push(candidate);
        }

        debug!(count, attempts, "Sampled reviewer panel");
        Ok(panel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::identity::{ConflictOfInterest, ExperienceLevel, KnowledgeLevel, Tone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed(conflict: ConflictOfInterest) -> ReviewerIdentity {
        ReviewerIdentity::new(
            "Reviewer 1",
            KnowledgeLevel::Advanced,
            ExperienceLevel::MidCareer,
            Tone::Neutral,
            conflict,
        )
    }

    #[test]
    fn test_sample_returns_non_conflicted() {
        let mut rng = StdRng::seed_from_u64(1);
        let panel = PanelSampler::default().sample(&mut rng, 3).unwrap();
        assert_eq!(panel.len(), 3);
        assert!(panel.iter().all(|r| !r.is_conflicted()));
    }

    #[test]
    fn test_sample_four() {
        let mut rng = StdRng::seed_from_u64(99);
        let panel = PanelSampler::default().sample(&mut rng, 4).unwrap();
        assert_eq!(panel.len(), 4);
    }

    #[test]
    fn test_exhaustion_is_typed_error() {
        let sampler = PanelSampler::new(25);
        let err = sampler
            .sample_with(3, || fixed(ConflictOfInterest::Colleague))
            .unwrap_err();
        match err {
            PanelError::SamplingExhausted {
                wanted,
                found,
                attempts,
            } => {
                assert_eq!(wanted, 3);
                assert_eq!(found, 0);
                assert_eq!(attempts, 25);
            }
        }
    }

    #[test]
    fn test_rejected_draws_count_as_attempts() {
        let mut flip = false;
        let panel = PanelSampler::new(10)
            .sample_with(2, || {
                flip = !flip;
                if flip {
                    fixed(ConflictOfInterest::Personal)
                } else {
                    fixed(ConflictOfInterest::None)
                }
            })
            .unwrap();
        assert_eq!(panel.len(), 2);
    }
}
