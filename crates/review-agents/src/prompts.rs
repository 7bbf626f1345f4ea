//! Agent role names and prompt text.
//!
//! Role prompts become the system instructions of provisioned agents; the
//! builder functions produce the per-call user messages.

pub const DESK_REVIEWER: &str = "deskreviewer";
pub const QUESTIONER: &str = "questioner";
pub const GRAMMAR: &str = "grammar";
pub const TEST: &str = "test";
pub const NOVELTY: &str = "novelty";
pub const FACT_CHECKER: &str = "factchecker";

/// Number of sampled reviewer personas. Personas are carried in the reviewer
/// prompts, so they are never provisioned as agents of their own.
pub const PANEL_SIZE: usize = 3;

pub fn desk_reviewer_system(topics: &[String]) -> String {
    format!(
        "You are a desk reviewer for a conference. Your job is to evaluate the section for \
         relevance to the conference topics mentioned in {}. Respond with [Accept] or [Reject], \
         and provide reasoning for your decision.",
        topics.join(", ")
    )
}

pub const QUESTIONER_SYSTEM: &str = "\
Your job is to ask questions about this section. Your questions should be open-ended and \
should not be leading. Your questions should be about the content of the paper, not about its \
authors, its presentation, the conference or the reviewers.";

pub const GRAMMAR_SYSTEM: &str = "\
You are a grammar checker. Review the section for grammar issues. Respond with [Accept] if the \
grammar is correct or [Reject] if there are issues, followed by specific corrections.";

pub const TEST_SYSTEM: &str = "\
You are an evaluation reviewer. Check whether the claims made in the section are backed by \
experiments, measurements or proofs. Respond with [Accept] if they are adequately supported or \
[Reject] if they are not, followed by what evidence is missing.";

pub const NOVELTY_SYSTEM: &str = "\
You are a novelty checker. Judge whether the section contributes ideas that are new relative to \
well known prior work. Respond with [Accept] if the contribution is novel or [Reject] if it is \
not, and name the closest prior work you know of.";

pub const FACT_CHECKER_SYSTEM: &str = "\
You are a fact checker. Verify the factual claims in the section. Respond with [Accept] if the \
claims are accurate or [Reject] if any claim is false or unsupported, and list the problems.";

/// Prefix of every Q&A stage question.
pub const QA_PREAMBLE: &str = "Answer the following question with respect to your system message \
(what you know). If you have no answer, say 'No answer'.\n";

pub fn qa_prompt(question: &str) -> String {
    format!("{QA_PREAMBLE}{question}")
}

/// User message for one reviewer turn in the section discussion.
pub fn reviewer_prompt(persona: &str, section_text: &str, previous: Option<&str>) -> String {
    let discussion = previous
        .map(|p| format!("Previous discussion so far: {p}\n\n"))
        .unwrap_or_default();
    format!(
        "{persona}\n\n\
         The section for review:\n\"{section_text}\"\n\n\
         {discussion}\
         Respond in a conversational manner, directly addressing previous comments if any. \
         If you agree with a previous reviewer, elaborate on why. \
         If you disagree, provide justification and alternative suggestions.\n\n\
         At the end of your review, explicitly state your final decision (Accept, WeakAccept, \
         WeakReject, Reject)."
    )
}

/// User message asking for meeting-minutes style minutes and a majority decision.
pub fn final_decision_prompt(section_text: &str, reviews: &str) -> String {
    format!(
        "Summarize the discussion among the reviewers about the following research paper \
         section.\n\n\
         Section: \"{section_text}\"\n\n\
         Reviews:\n{reviews}\n\n\
         Format the summary as if recording minutes of a meeting. Highlight agreements, \
         disagreements, and key takeaways.\n\n\
         At the end, determine the final decision based on the majority vote (Accept, \
         WeakAccept, WeakReject, Reject)."
    )
}

/// User message asking for an abstractive summary of the weighted opinions.
pub fn condense_prompt(weighted_text: &str, min_words: usize, max_words: usize) -> String {
    format!(
        "Summarize the following reviewer opinions in between {min_words} and {max_words} \
         words. Opinions that are repeated carry more weight. Reply with the summary only.\n\n\
         {weighted_text}"
    )
}

pub fn fact_needs_lookup_prompt(section_text: &str) -> String {
    format!(
        "Do you need more facts to verify the claims in the following section? \
         Answer only yes or no.\n\n{section_text}"
    )
}

pub fn fact_with_reference_prompt(section_text: &str, reference: &str) -> String {
    format!(
        "Using the reference below, verify the claims in the section. Respond with [Accept] or \
         [Reject] and explain.\n\nReference:\n{reference}\n\nSection:\n{section_text}"
    )
}

pub fn fact_direct_prompt(section_text: &str) -> String {
    format!(
        "Verify the claims in the section. Respond with [Accept] or [Reject] and explain.\n\n\
         Section:\n{section_text}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reviewer_prompt_includes_discussion_only_when_present() {
        let first = reviewer_prompt("You are Reviewer 7.", "We prune heads.", None);
        assert!(first.starts_with("You are Reviewer 7."));
        assert!(first.contains("\"We prune heads.\""));
        assert!(!first.contains("Previous discussion"));

        let later = reviewer_prompt("You are Reviewer 7.", "We prune heads.", Some("I accept."));
        assert!(later.contains("Previous discussion so far: I accept."));
    }

    #[test]
    fn test_desk_reviewer_lists_topics() {
        let system = desk_reviewer_system(&["Pruning".to_string(), "Compilers".to_string()]);
        assert!(system.contains("topics mentioned in Pruning, Compilers."));
    }

    #[test]
    fn test_qa_prompt() {
        assert_eq!(
            qa_prompt("What is pruned?"),
            "Answer the following question with respect to your system message (what you know). \
             If you have no answer, say 'No answer'.\nWhat is pruned?"
        );
    }
}
