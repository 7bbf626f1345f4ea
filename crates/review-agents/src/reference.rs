//! Encyclopedia lookup for the fact checker.
//!
//! Queries are built from the section's most frequent content words, first
//! five, then three, then one, until a search returns a hit.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

use crate::agent::AgentError;

pub const WIKIPEDIA_API: &str = "https://en.wikipedia.org/w/api.php";

/// Keyword counts tried in order, one search per count.
pub const QUERY_KEYWORD_COUNTS: [usize; 3] = [5, 3, 1];

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("TAG_RE regex should compile"));

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "et",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "him", "his", "how", "however", "i", "if", "in", "into", "is", "it", "its", "itself", "may",
    "me", "more", "most", "my", "no", "nor", "not", "of", "off", "on", "once", "only", "or",
    "other", "our", "ours", "out", "over", "own", "same", "she", "should", "so", "some", "such",
    "than", "that", "the", "their", "them", "then", "there", "these", "they", "this", "those",
    "through", "to", "too", "under", "until", "up", "us", "very", "was", "we", "were", "what",
    "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would", "you",
    "your",
];

#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// Best matching reference text for `query`, if any.
    async fn search(&self, query: &str) -> Result<Option<String>, AgentError>;
}

/// The `n` most frequent non-stopword words, ties broken by first occurrence.
pub fn extract_keywords(text: &str, n: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let words = text
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .map(|w| w.trim_matches('-').to_lowercase())
        .filter(|w| w.len() > 1 && !STOPWORDS.contains(&w.as_str()))
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()));

    for (position, word) in words.enumerate() {
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().take(n).map(|(word, _, _)| word).collect()
}

/// Progressively shorter queries, without repeats.
pub fn lookup_queries(text: &str) -> Vec<String> {
    let mut queries: Vec<String> = Vec::new();
    for count in QUERY_KEYWORD_COUNTS {
        let query = extract_keywords(text, count).join(" ");
        if !query.is_empty() && !queries.contains(&query) {
            queries.push(query);
        }
    }
    queries
}

/// Try each query in turn and return the first hit.
pub async fn find_reference<L>(lookup: &L, text: &str) -> Option<String>
where
    L: ReferenceLookup + ?Sized,
{
    for (attempt, query) in lookup_queries(text).iter().enumerate() {
        match lookup.search(query).await {
            Ok(Some(hit)) => {
                info!(attempt = attempt + 1, query = %query, "Reference found");
                return Some(hit);
            }
            Ok(None) => debug!(attempt = attempt + 1, query = %query, "No reference hit"),
            Err(e) => debug!(attempt = attempt + 1, query = %query, error = %e, "Reference search failed"),
        }
    }
    None
}

pub struct WikipediaLookup {
    api_url: String,
    client: reqwest::Client,
}

impl WikipediaLookup {
    pub fn new(timeout: Duration) -> Result<Self, AgentError> {
        Self::with_api_url(WIKIPEDIA_API, timeout)
    }

    pub fn with_api_url(api_url: impl Into<String>, timeout: Duration) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Transport(e.to_string()))?;
        Ok(Self {
            api_url: api_url.into(),
            client,
        })
    }
}

/// `**title**\nsnippet\nurl` for the top search hit, with markup removed.
pub(crate) fn format_top_hit(body: &Value) -> Option<String> {
    let top = body.pointer("/query/search/0")?;
    let title = top.get("title")?.as_str()?;
    let snippet = top.get("snippet").and_then(Value::as_str).unwrap_or_default();
    let snippet = TAG_RE.replace_all(snippet, "");
    let url = format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_"));
    Some(format!("**{title}**\n{snippet}\n{url}"))
}

#[async_trait]
impl ReferenceLookup for WikipediaLookup {
    async fn search(&self, query: &str) -> Result<Option<String>, AgentError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", "1"),
            ])
            .send()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Status { status, body });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AgentError::Malformed(e.to_string()))?;
        Ok(format_top_hit(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_keywords_by_frequency_then_position() {
        let text = "Pruning attention heads. Attention heads are pruned; pruning keeps accuracy \
                    and the heads stay useful. 2024";
        assert_eq!(extract_keywords(text, 3), vec!["heads", "pruning", "attention"]);
        assert_eq!(extract_keywords(text, 1), vec!["heads"]);
        assert!(extract_keywords("the and of", 5).is_empty());
    }

    #[test]
    fn test_queries_shrink_and_dedupe() {
        let queries = lookup_queries("transformer transformer pruning heads accuracy latency");
        assert_eq!(
            queries,
            vec![
                "transformer pruning heads accuracy latency",
                "transformer pruning heads",
                "transformer",
            ]
        );
        assert_eq!(lookup_queries("gpu gpu"), vec!["gpu"]);
    }

    #[test]
    fn test_format_top_hit_strips_markup() {
        let body = json!({"query": {"search": [{
            "title": "Decision tree pruning",
            "snippet": "<span class=\"searchmatch\">Pruning</span> reduces size"
        }]}});
        assert_eq!(
            format_top_hit(&body).unwrap(),
            "**Decision tree pruning**\nPruning reduces size\n\
             https://en.wikipedia.org/wiki/Decision_tree_pruning"
        );
        assert_eq!(format_top_hit(&json!({"query": {"search": []}})), None);
    }

    struct Recorded {
        hit_on: usize,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ReferenceLookup for Recorded {
        async fn search(&self, query: &str) -> Result<Option<String>, AgentError> {
            let mut queries = self.queries.lock().unwrap();
            queries.push(query.to_string());
            if queries.len() == self.hit_on {
                Ok(Some(format!("hit for {query}")))
            } else {
                Err(AgentError::Transport("timeout".into()))
            }
        }
    }

    #[tokio::test]
    async fn test_find_reference_retries_shorter_queries() {
        let lookup = Recorded {
            hit_on: 3,
            queries: Mutex::new(Vec::new()),
        };
        let text = "alpha alpha beta gamma delta epsilon zeta";
        let hit = find_reference(&lookup, text).await;
        assert_eq!(hit.as_deref(), Some("hit for alpha"));
        assert_eq!(lookup.queries.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_find_reference_gives_up() {
        let lookup = Recorded {
            hit_on: 99,
            queries: Mutex::new(Vec::new()),
        };
        assert_eq!(find_reference(&lookup, "alpha beta gamma delta epsilon").await, None);
        assert_eq!(lookup.queries.lock().unwrap().len(), 3);
    }
}
