//! SSE stream creation and state machine for Anthropic Messages API.
//!
//! Implements the streaming protocol described in the Anthropic docs:
//! 1. `message_start` -- Message object with initial usage
//! 2. Per block: `content_block_start` -> N x `content_block_delta` -> `content_block_stop`
//! 3. `message_delta` -- stop_reason and cumulative usage
//! 4. `message_stop` -- final event
//! 5. `ping` events may appear anywhere (keepalive)
//! 6. `error` events may appear mid-stream
//!
//! Tool use input arrives as partial JSON fragments via `input_json_delta`.
//! These are accumulated per content block index and parsed only after
//! `content_block_stop`.

use std::collections::HashMap;

use futures_util::StreamExt;
use reqwest_eventsource::{Error as EventSourceError, Event, EventSource, retry};

use devchat_core::llm::provider::LlmEventStream;
use devchat_types::llm::{LlmError, StopReason, StreamEvent, Usage};

use super::types::{
    AnthropicContentBlock, AnthropicDelta, AnthropicUsage, ContentBlockDeltaPayload,
    ContentBlockStartPayload, ContentBlockStopPayload, ErrorPayload, MessageDeltaPayload,
    MessageStartPayload,
};

/// Accumulates partial JSON fragments for tool use input within a content block.
struct ToolUseAccumulator {
    id: String,
    name: String,
    json_buffer: String,
}

/// Internal state for the SSE state machine.
#[derive(Default)]
pub(crate) struct StreamState {
    tool_input_buffers: HashMap<u32, ToolUseAccumulator>,
    message_id: Option<String>,
}

/// Create a streaming SSE connection to the Anthropic Messages API.
///
/// `request` must be a fully built POST (headers and JSON body). The
/// connection is never retried: a failed request ends the stream with one
/// error item.
pub fn create_anthropic_stream(request: reqwest::RequestBuilder) -> LlmEventStream {
    Box::pin(async_stream::stream! {
        let mut es = match EventSource::new(request) {
            Ok(es) => es,
            Err(e) => {
                yield Err(LlmError::Provider {
                    message: format!("request cannot be streamed: {e}"),
                });
                return;
            }
        };
        es.set_retry_policy(Box::new(retry::Never));

        let mut state = StreamState::default();

        while let Some(event) = es.next().await {
            match event {
                Ok(Event::Open) => yield Ok(StreamEvent::Connected),
                Ok(Event::Message(message)) => {
                    let events = match process_anthropic_event(&message.event, &message.data, &mut state) {
                        Ok(events) => events,
                        Err(e) => {
                            es.close();
                            yield Err(e);
                            return;
                        }
                    };

                    let mut done = false;
                    for event in events {
                        done |= matches!(event, StreamEvent::Done);
                        yield Ok(event);
                    }
                    if done {
                        tracing::debug!(message_id = ?state.message_id, "Anthropic stream finished");
                        es.close();
                        break;
                    }
                }
                Err(EventSourceError::StreamEnded) => break,
                Err(e) => {
                    es.close();
                    yield Err(map_stream_error(e).await);
                    return;
                }
            }
        }
    })
}

/// Map a transport or HTTP-status failure to an [`LlmError`].
async fn map_stream_error(err: EventSourceError) -> LlmError {
    match err {
        EventSourceError::InvalidStatusCode(status, response) => {
            let retry_after_ms = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(|secs| secs * 1000);
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %error_body, "Anthropic stream API error response");

            match status.as_u16() {
                400 => LlmError::InvalidRequest(error_body),
                401 => LlmError::AuthenticationFailed,
                429 => LlmError::RateLimited { retry_after_ms },
                529 => LlmError::Overloaded(error_body),
                _ => LlmError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                },
            }
        }
        EventSourceError::InvalidContentType(content_type, _) => LlmError::Provider {
            message: format!("unexpected content type: {content_type:?}"),
        },
        EventSourceError::Transport(e) => LlmError::Provider {
            message: format!("HTTP request failed: {e}"),
        },
        other => LlmError::Stream(other.to_string()),
    }
}

fn usage_event(usage: AnthropicUsage) -> StreamEvent {
    StreamEvent::Usage(Usage {
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
        cache_creation_input_tokens: usage.cache_creation_input_tokens,
        cache_read_input_tokens: usage.cache_read_input_tokens,
    })
}

/// Process one SSE event into zero or more `StreamEvent`s.
pub(crate) fn process_anthropic_event(
    event_type: &str,
    json_data: &str,
    state: &mut StreamState,
) -> Result<Vec<StreamEvent>, LlmError> {
    let mut events = Vec::new();

    match event_type {
        "message_start" => {
            let payload: MessageStartPayload = serde_json::from_str(json_data)
                .map_err(|e| LlmError::Deserialization(format!("message_start: {e}")))?;
            tracing::debug!(message_id = %payload.message.id, model = %payload.message.model, "message started");
            state.message_id = Some(payload.message.id);
            if let Some(usage) = payload.message.usage {
                events.push(usage_event(usage));
            }
        }

        "content_block_start" => {
            let payload: ContentBlockStartPayload = serde_json::from_str(json_data)
                .map_err(|e| LlmError::Deserialization(format!("content_block_start: {e}")))?;
            if let AnthropicContentBlock::ToolUse { ref id, ref name, .. } = payload.content_block {
                state.tool_input_buffers.insert(
                    payload.index,
                    ToolUseAccumulator {
                        id: id.clone(),
                        name: name.clone(),
                        json_buffer: String::new(),
                    },
                );
            }
            events.push(StreamEvent::ContentBlockStart {
                index: payload.index,
                content_type: payload.content_block.type_name().to_string(),
            });
        }

        "content_block_delta" => {
            let payload: ContentBlockDeltaPayload = serde_json::from_str(json_data)
                .map_err(|e| LlmError::Deserialization(format!("content_block_delta: {e}")))?;
            match payload.delta {
                AnthropicDelta::TextDelta { text } => {
                    events.push(StreamEvent::TextDelta {
                        index: payload.index,
                        text,
                    });
                }
                AnthropicDelta::ThinkingDelta { thinking } => {
                    events.push(StreamEvent::ThinkingDelta {
                        index: payload.index,
                        thinking,
                    });
                }
                AnthropicDelta::InputJsonDelta { partial_json } => {
                    if let Some(acc) = state.tool_input_buffers.get_mut(&payload.index) {
                        acc.json_buffer.push_str(&partial_json);
                    }
                }
                AnthropicDelta::SignatureDelta { .. } => {}
            }
        }

        "content_block_stop" => {
            let payload: ContentBlockStopPayload = serde_json::from_str(json_data)
                .map_err(|e| LlmError::Deserialization(format!("content_block_stop: {e}")))?;
            if let Some(acc) = state.tool_input_buffers.remove(&payload.index) {
                let input = if acc.json_buffer.is_empty() {
                    serde_json::Value::Object(Default::default())
                } else {
                    serde_json::from_str(&acc.json_buffer)
                        .map_err(|e| LlmError::Deserialization(format!("tool input JSON: {e}")))?
                };
                events.push(StreamEvent::ToolUseComplete {
                    id: acc.id,
                    name: acc.name,
                    input,
                });
            }
            events.push(StreamEvent::ContentBlockStop {
                index: payload.index,
            });
        }

        "message_delta" => {
            let payload: MessageDeltaPayload = serde_json::from_str(json_data)
                .map_err(|e| LlmError::Deserialization(format!("message_delta: {e}")))?;
            let stop_reason = payload
                .delta
                .stop_reason
                .as_deref()
                .and_then(|s| s.parse::<StopReason>().ok())
                .unwrap_or(StopReason::EndTurn);
            events.push(usage_event(payload.usage));
            events.push(StreamEvent::MessageDelta { stop_reason });
        }

        "message_stop" => {
            events.push(StreamEvent::Done);
        }

        "ping" => {}

        "error" => {
            let payload: ErrorPayload = serde_json::from_str(json_data)
                .map_err(|e| LlmError::Deserialization(format!("error event: {e}")))?;
            let err = match payload.error.error_type.as_str() {
                "overloaded_error" => LlmError::Overloaded(payload.error.message),
                "rate_limit_error" => LlmError::RateLimited {
                    retry_after_ms: None,
                },
                "authentication_error" => LlmError::AuthenticationFailed,
                "invalid_request_error" => LlmError::InvalidRequest(payload.error.message),
                _ => LlmError::Provider {
                    message: payload.error.message,
                },
            };
            return Err(err);
        }

        unknown => {
            tracing::warn!(event_type = unknown, "unknown Anthropic event type, skipping");
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_message_start() {
        let json = r#"{"type":"message_start","message":{"id":"msg_123","model":"claude-3-sonnet-20240229","usage":{"input_tokens":100,"output_tokens":1}}}"#;
        let mut state = StreamState::default();
        let events = process_anthropic_event("message_start", json, &mut state).unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], StreamEvent::Usage(u) if u.input_tokens == 100));
        assert_eq!(state.message_id.as_deref(), Some("msg_123"));
    }

    #[test]
    fn test_tool_input_accumulates_across_deltas() {
        let mut state = StreamState::default();
        let start = r#"{"index":1,"content_block":{"type":"tool_use","id":"toolu_1","name":"PythonREPL","input":{}}}"#;
        let events = process_anthropic_event("content_block_start", start, &mut state).unwrap();
        assert!(matches!(&events[0], StreamEvent::ContentBlockStart { content_type, .. } if content_type == "tool_use"));

        for part in [r#"{\"input\": \"print"#, r#"(2+2)\"}"#] {
            let delta = format!(
                r#"{{"index":1,"delta":{{"type":"input_json_delta","partial_json":"{part}"}}}}"#
            );
            let events = process_anthropic_event("content_block_delta", &delta, &mut state).unwrap();
            assert!(events.is_empty());
        }

        let events =
            process_anthropic_event("content_block_stop", r#"{"index":1}"#, &mut state).unwrap();
        assert_eq!(events.len(), 2);
        match &events[0] {
            StreamEvent::ToolUseComplete { id, name, input } => {
                assert_eq!(id, "toolu_1");
                assert_eq!(name, "PythonREPL");
                assert_eq!(input["input"], "print(2+2)");
            }
            other => panic!("expected ToolUseComplete, got {other:?}"),
        }
    }

    #[test]
    fn test_tool_without_input_yields_empty_object() {
        let mut state = StreamState::default();
        let start = r#"{"index":0,"content_block":{"type":"tool_use","id":"t","name":"x","input":{}}}"#;
        process_anthropic_event("content_block_start", start, &mut state).unwrap();
        let events =
            process_anthropic_event("content_block_stop", r#"{"index":0}"#, &mut state).unwrap();
        assert!(matches!(&events[0], StreamEvent::ToolUseComplete { input, .. } if input.as_object().is_some_and(|m| m.is_empty())));
    }

    #[test]
    fn test_message_delta_parses_stop_reason() {
        let json = r#"{"type":"message_delta","delta":{"stop_reason":"tool_use"},"usage":{"output_tokens":15}}"#;
        let mut state = StreamState::default();
        let events = process_anthropic_event("message_delta", json, &mut state).unwrap();
        assert!(matches!(&events[0], StreamEvent::Usage(u) if u.output_tokens == 15));
        assert!(matches!(
            &events[1],
            StreamEvent::MessageDelta { stop_reason: StopReason::ToolUse }
        ));
    }

    #[test]
    fn test_ping_and_unknown_events_are_ignored() {
        let mut state = StreamState::default();
        assert!(process_anthropic_event("ping", "{}", &mut state).unwrap().is_empty());
        assert!(process_anthropic_event("mystery", "{}", &mut state).unwrap().is_empty());
    }

    #[test]
    fn test_error_event_maps_to_llm_error() {
        let mut state = StreamState::default();
        let json = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let err = process_anthropic_event("error", json, &mut state).unwrap_err();
        assert!(matches!(err, LlmError::Overloaded(m) if m == "Overloaded"));

        let json = r#"{"error":{"type":"authentication_error","message":"Invalid API key"}}"#;
        let err = process_anthropic_event("error", json, &mut state).unwrap_err();
        assert!(matches!(err, LlmError::AuthenticationFailed));
    }

    #[test]
    fn test_malformed_payload_is_deserialization_error() {
        let mut state = StreamState::default();
        let err = process_anthropic_event("content_block_delta", "not json", &mut state).unwrap_err();
        assert!(matches!(err, LlmError::Deserialization(_)));
    }
}
