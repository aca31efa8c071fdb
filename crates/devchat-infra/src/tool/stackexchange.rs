//! StackExchange knowledge-lookup tool.
//!
//! Searches question and answer excerpts through the public StackExchange
//! API (`/2.3/search/excerpts`) and renders the best matches as plain text
//! for the model.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use devchat_core::tool::Tool;
use devchat_types::config::StackExchangeConfig;
use devchat_types::tool::{ToolDefinition, ToolError};

pub const STACKEXCHANGE_NAME: &str = "StackExchangeAPI";

const STACKEXCHANGE_DESCRIPTION: &str =
    "A tool to get related questions from StackExchange for code-related errors or general queries.";

/// Separator between rendered questions.
const RESULT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
    error_name: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    item_type: String,
    question_id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    is_accepted: bool,
}

/// Looks up related questions on a StackExchange site.
pub struct StackExchangeTool {
    definition: ToolDefinition,
    client: reqwest::Client,
    config: StackExchangeConfig,
}

impl StackExchangeTool {
    pub fn new(config: StackExchangeConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .user_agent(concat!("devchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ToolError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            definition: ToolDefinition::single_input(
                STACKEXCHANGE_NAME,
                STACKEXCHANGE_DESCRIPTION,
                "Search text, such as an error message or a question.",
            ),
            client,
            config,
        })
    }

    async fn search(&self, query: &str) -> Result<SearchResponse, ToolError> {
        let url = format!(
            "{}/2.3/search/excerpts",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .get(&url)
            .query(&[
                ("site", self.config.site.as_str()),
                (self.config.query_type.param(), query),
            ])
            .send()
            .await
            .map_err(|e| ToolError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::Http(e.to_string()))?;

        let parsed: Result<SearchResponse, _> = serde_json::from_str(&body);
        match parsed {
            Ok(SearchResponse {
                error_message: Some(message),
                error_name,
                ..
            }) => Err(ToolError::Http(match error_name {
                Some(name) => format!("{name}: {message}"),
                None => message,
            })),
            Ok(_) if !status.is_success() => Err(ToolError::Http(format!("HTTP {status}"))),
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(ToolError::Http(format!("HTTP {status}"))),
            Err(e) => Err(ToolError::Decode(e.to_string())),
        }
    }
}

impl Tool for StackExchangeTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let query = input.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidInput("empty search query".to_string()));
        }

        let response = self.search(query).await?;
        debug!(query, items = response.items.len(), "StackExchange search finished");
        Ok(render_results(query, &response.items, self.config.max_results))
    }
}

fn render_results(query: &str, items: &[SearchItem], max_results: usize) -> String {
    let questions = items
        .iter()
        .filter(|item| item.item_type == "question")
        .take(max_results)
        .collect::<Vec<_>>();

    if questions.is_empty() {
        return format!("No relevant results found for '{query}' on Stack Overflow.");
    }

    questions
        .into_iter()
        .map(|question| {
            let mut text = format!(
                "Question: {}\n{}",
                clean_excerpt(&question.title),
                clean_excerpt(&question.excerpt)
            );

            let mut answers = items
                .iter()
                .filter(|item| item.item_type == "answer" && item.question_id == question.question_id);
            let first = answers.next();
            let best = first
                .filter(|a| a.is_accepted)
                .or_else(|| answers.find(|a| a.is_accepted))
                .or(first);

            if let Some(answer) = best {
                text.push_str("\nAnswer: ");
                text.push_str(&clean_excerpt(&answer.excerpt));
            }
            text
        })
        .collect::<Vec<_>>()
        .join(RESULT_SEPARATOR)
}

/// Drop search-highlight markup and decode HTML entities.
fn clean_excerpt(raw: &str) -> String {
    let stripped = raw
        .replace("<span class=\"highlight\">", "")
        .replace("</span>", "");
    unescape_html(&stripped)
}

/// Decode the named and numeric HTML entities the API emits.
fn unescape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "hellip" => Some('\u{2026}'),
        _ => {
            let number = entity.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devchat_types::config::QueryType;
    use httpmock::{Method::GET, MockServer};

    fn item(kind: &str, question_id: u64, title: &str, excerpt: &str, accepted: bool) -> SearchItem {
        SearchItem {
            item_type: kind.to_string(),
            question_id,
            title: title.to_string(),
            excerpt: excerpt.to_string(),
            is_accepted: accepted,
        }
    }

    fn tool_for(server: &MockServer) -> StackExchangeTool {
        StackExchangeTool::new(StackExchangeConfig {
            base_url: server.base_url(),
            ..StackExchangeConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn unescape_handles_named_and_numeric_entities() {
        assert_eq!(unescape_html("a &lt;b&gt; &amp;&amp; &#39;c&#x27; &quot;d&quot;"), "a <b> && 'c' \"d\"");
        assert_eq!(unescape_html("AT&T & more"), "AT&T & more");
        assert_eq!(unescape_html("&bogus;"), "&bogus;");
    }

    #[test]
    fn clean_excerpt_strips_highlight_spans() {
        assert_eq!(
            clean_excerpt("cannot <span class=\"highlight\">borrow</span> &#39;x&#39;"),
            "cannot borrow 'x'"
        );
    }

    #[test]
    fn render_prefers_accepted_answer() {
        let items = vec![
            item("question", 1, "Why E0502?", "I get E0502", false),
            item("answer", 1, "", "first answer", false),
            item("answer", 1, "", "accepted answer", true),
            item("answer", 2, "", "other question", true),
        ];
        assert_eq!(
            render_results("E0502", &items, 3),
            "Question: Why E0502?\nI get E0502\nAnswer: accepted answer"
        );
    }

    #[test]
    fn render_falls_back_to_first_answer_and_limits_results() {
        let items = vec![
            item("question", 1, "Q1", "e1", false),
            item("question", 2, "Q2", "e2", false),
            item("answer", 2, "", "a2", false),
            item("question", 3, "Q3", "e3", false),
        ];
        assert_eq!(
            render_results("q", &items, 2),
            "Question: Q1\ne1\n\nQuestion: Q2\ne2\nAnswer: a2"
        );
    }

    #[test]
    fn render_without_questions_reports_no_results() {
        assert_eq!(
            render_results("zzz", &[], 3),
            "No relevant results found for 'zzz' on Stack Overflow."
        );
    }

    #[tokio::test]
    async fn invoke_queries_search_excerpts() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/2.3/search/excerpts")
                    .query_param("site", "stackoverflow")
                    .query_param("q", "borrow checker");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(serde_json::json!({
                        "items": [
                            {"item_type": "question", "question_id": 7, "title": "What is the &quot;borrow checker&quot;?", "excerpt": "The <span class=\"highlight\">borrow</span> checker..."},
                            {"item_type": "answer", "question_id": 7, "excerpt": "It enforces ownership.", "is_accepted": true}
                        ],
                        "has_more": false
                    }));
            })
            .await;

        let out = tool_for(&server).invoke("  borrow checker ").await.unwrap();
        mock.assert_async().await;
        assert_eq!(
            out,
            "Question: What is the \"borrow checker\"?\nThe borrow checker...\nAnswer: It enforces ownership."
        );
    }

    #[tokio::test]
    async fn query_type_selects_parameter() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/2.3/search/excerpts")
                    .query_param("title", "lifetimes");
                then.status(200).json_body(serde_json::json!({"items": []}));
            })
            .await;

        let tool = StackExchangeTool::new(StackExchangeConfig {
            base_url: server.base_url(),
            query_type: QueryType::Title,
            ..StackExchangeConfig::default()
        })
        .unwrap();

        let out = tool.invoke("lifetimes").await.unwrap();
        mock.assert_async().await;
        assert_eq!(out, "No relevant results found for 'lifetimes' on Stack Overflow.");
    }

    #[tokio::test]
    async fn api_error_message_is_http_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/2.3/search/excerpts");
                then.status(400).json_body(serde_json::json!({
                    "error_id": 400,
                    "error_name": "bad_parameter",
                    "error_message": "site is required"
                }));
            })
            .await;

        let err = tool_for(&server).invoke("anything").await.unwrap_err();
        assert_eq!(err, ToolError::Http("bad_parameter: site is required".to_string()));
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let server = MockServer::start_async().await;
        let err = tool_for(&server).invoke("   ").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }
}
