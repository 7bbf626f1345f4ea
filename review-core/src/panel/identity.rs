//! Reviewer identities
//!
//! A [`ReviewerIdentity`] is the immutable persona a reviewer agent is bound
//! to. Identities are drawn at random from small fixed enumerations and never
//! change after creation.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decisions a peer reviewer persona is allowed to give.
pub const DECISION_VOCABULARY: &[&str] = &["Accept", "WeakAccept", "WeakReject", "Reject"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnowledgeLevel {
    Novice,
    Intermediate,
    Advanced,
    Expert,
}

impl KnowledgeLevel {
    pub const ALL: [KnowledgeLevel; 4] = [
        KnowledgeLevel::Novice,
        KnowledgeLevel::Intermediate,
        KnowledgeLevel::Advanced,
        KnowledgeLevel::Expert,
    ];
}

impl fmt::Display for KnowledgeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnowledgeLevel::Novice => write!(f, "Novice"),
            KnowledgeLevel::Intermediate => write!(f, "Intermediate"),
            KnowledgeLevel::Advanced => write!(f, "Advanced"),
            KnowledgeLevel::Expert => write!(f, "Expert"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceLevel {
    EarlyCareer,
    MidCareer,
    SeniorCareer,
    DistinguishedLeader,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 4] = [
        ExperienceLevel::EarlyCareer,
        ExperienceLevel::MidCareer,
        ExperienceLevel::SeniorCareer,
        ExperienceLevel::DistinguishedLeader,
    ];
}

/// Rendered with its article so it reads inside a sentence ("an Early Career").
impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperienceLevel::EarlyCareer => write!(f, "an Early Career"),
            ExperienceLevel::MidCareer => write!(f, "a Mid Career"),
            ExperienceLevel::SeniorCareer => write!(f, "a Senior Career"),
            ExperienceLevel::DistinguishedLeader => write!(f, "a Distinguished Leader"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    Supportive,
    Neutral,
    Critical,
    Harsh,
    Diplomatic,
}

impl Tone {
    pub const ALL: [Tone; 5] = [
        Tone::Supportive,
        Tone::Neutral,
        Tone::Critical,
        Tone::Harsh,
        Tone::Diplomatic,
    ];
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tone::Supportive => write!(f, "Supportive"),
            Tone::Neutral => write!(f, "Neutral"),
            Tone::Critical => write!(f, "Critical"),
            Tone::Harsh => write!(f, "Harsh"),
            Tone::Diplomatic => write!(f, "Diplomatic"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictOfInterest {
    None,
    Colleague,
    MentorMentee,
    Personal,
    Professional,
}

impl ConflictOfInterest {
    pub const ALL: [ConflictOfInterest; 5] = [
        ConflictOfInterest::None,
        ConflictOfInterest::Colleague,
        ConflictOfInterest::MentorMentee,
        ConflictOfInterest::Personal,
        ConflictOfInterest::Professional,
    ];
}

impl fmt::Display for ConflictOfInterest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictOfInterest::None => write!(f, "None"),
            ConflictOfInterest::Colleague => write!(f, "Colleague"),
            ConflictOfInterest::MentorMentee => write!(f, "Mentor/Mentee"),
            ConflictOfInterest::Personal => write!(f, "Personal"),
            ConflictOfInterest::Professional => write!(f, "Professional"),
        }
    }
}

/// Immutable reviewer persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerIdentity {
    name: String,
    knowledge: KnowledgeLevel,
    experience: ExperienceLevel,
    tone: Tone,
    conflict: ConflictOfInterest,
    decision_vocabulary: Vec<String>,
}

impl ReviewerIdentity {
    pub fn new(
        name: impl Into<String>,
        knowledge: KnowledgeLevel,
        experience: ExperienceLevel,
        tone: Tone,
        conflict: ConflictOfInterest,
    ) -> Self {
        Self {
            name: name.into(),
            knowledge,
            experience,
            tone,
            conflict,
            decision_vocabulary: DECISION_VOCABULARY.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Draw a uniformly random identity named `Reviewer <1..=100>`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let name = format!("Reviewer {}", rng.gen_range(1..=100));
        Self::new(
            name,
            pick(&KnowledgeLevel::ALL, rng),
            pick(&ExperienceLevel::ALL, rng),
            pick(&Tone::ALL, rng),
            pick(&ConflictOfInterest::ALL, rng),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn knowledge(&self) -> KnowledgeLevel {
        self.knowledge
    }

    pub fn experience(&self) -> ExperienceLevel {
        self.experience
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }

    pub fn conflict(&self) -> ConflictOfInterest {
        self.conflict
    }

    pub fn decision_vocabulary(&self) -> &[String] {
        &self.decision_vocabulary
    }

    pub fn is_conflicted(&self) -> bool {
        self.conflict != ConflictOfInterest::None
    }

    /// Persona text used as the reviewer's standing instructions.
    pub fn persona(&self) -> String {
        let conflict = if self.is_conflicted() {
            format!("You have a {} conflict of interest.", self.conflict)
        } else {
            "You have no conflict of interest.".to_string()
        };
        format!(
            "You are {}, assigned to review this paper. You are {} reviewer with {} expertise. \
             Your feedback tone is {}. {} Your decisions may include: [{}]. \
             At the end of your review, provide a final decision from these options.",
            self.name,
            self.experience,
            self.knowledge,
            self.tone,
            conflict,
            self.decision_vocabulary.join(", "),
        )
    }
}

fn pick<T: Copy, R: Rng + ?Sized>(options: &[T], rng: &mut R) -> T {
    // Every option table is a non-empty const array.
    *options.choose(rng).unwrap_or(&options[0])
}
