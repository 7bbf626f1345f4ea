//! Paper-derived agent identities.
//!
//! Every section of the paper becomes an agent whose standing instructions are
//! the section text. The agent is named by a short key derived from the
//! heading. Two headings that shorten to the same key collide and the later
//! section replaces the earlier one.

use crate::section::Section;

/// Maximum length of a paper agent key, in characters.
pub const PAPER_KEY_LEN: usize = 10;

/// Strip spaces and newlines from a heading and cap it at [`PAPER_KEY_LEN`].
pub fn paper_agent_key(heading: &str) -> String {
    heading
        .chars()
        .filter(|c| *c != '\n' && *c != ' ')
        .take(PAPER_KEY_LEN)
        .collect()
}

/// One paper-derived agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperAgent {
    pub key: String,
    pub heading: String,
    pub system: String,
}

/// Ordered, key-unique set of paper agents.
#[derive(Debug, Clone, Default)]
pub struct PaperPanel {
    agents: Vec<PaperAgent>,
}

impl PaperPanel {
    pub fn from_sections(sections: &[Section]) -> Self {
        let mut panel = Self::default();
        for section in sections {
            panel.insert(&section.heading, &section.content);
        }
        panel
    }

    /// Insert an agent, replacing any earlier agent with the same key in place.
    pub fn insert(&mut self, heading: &str, system: &str) {
        let agent = PaperAgent {
            key: paper_agent_key(heading),
            heading: heading.to_string(),
            system: system.to_string(),
        };
        match self.agents.iter_mut().find(|a| a.key == agent.key) {
            Some(existing) => *existing = agent,
            None => self.agents.push(agent),
        }
    }

    pub fn agents(&self) -> &[PaperAgent] {
        &self.agents
    }

    pub fn keys(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.key.clone()).collect()
    }

    pub fn get(&self, key: &str) -> Option<&PaperAgent> {
        self.agents.iter().find(|a| a.key == key)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
