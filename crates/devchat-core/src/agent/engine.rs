//! Reason-act agent engine for devchat.
//!
//! `ReactAgent` drives the model/tool loop for one turn: it streams a
//! completion, surfaces the assistant text, hands every requested tool call
//! to the consumer as a [`ToolUseChunk`], feeds the results back to the
//! model, and repeats until the model answers without tools. OTel GenAI
//! spans instrument every turn.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};
use tracing::{debug, field, info, info_span};

use devchat_observe::genai_attrs::{
    GEN_AI_RESPONSE_FINISH_REASONS, GEN_AI_USAGE_INPUT_TOKENS, GEN_AI_USAGE_OUTPUT_TOKENS,
    OP_INVOKE_AGENT,
};
use devchat_types::agent::{AgentSettings, SessionId};
use devchat_types::error::AgentError;
use devchat_types::llm::{
    CompletionRequest, ContentBlock, LlmError, Message, ProviderCapabilities, StopReason,
    StreamEvent,
};
use devchat_types::tool::{ToolDefinition, ToolError, ToolInvocation};

use crate::chat::session::SessionStore;
use crate::llm::box_provider::BoxLlmProvider;

use super::chunk::{AgentChunk, AgentStream, ConversationAgent, ToolOutcome, ToolUseChunk};

/// Conversation agent running a reason-act loop over an LLM provider.
pub struct ReactAgent {
    provider: Arc<BoxLlmProvider>,
    tools: Arc<Vec<ToolDefinition>>,
    settings: Arc<AgentSettings>,
    sessions: Arc<SessionStore>,
}

impl ReactAgent {
    /// Create an agent that offers `tools` to the model.
    pub fn new(provider: BoxLlmProvider, tools: Vec<ToolDefinition>, settings: AgentSettings) -> Self {
        Self {
            provider: Arc::new(provider),
            tools: Arc::new(tools),
            settings: Arc::new(settings),
            sessions: Arc::new(SessionStore::new()),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }
}

impl ConversationAgent for ReactAgent {
    fn submit(&self, message: String, session: &SessionId) -> AgentStream {
        let span = info_span!(
            "gen_ai.invoke_agent",
            gen_ai.operation.name = OP_INVOKE_AGENT,
            gen_ai.provider.name = self.provider.name(),
            gen_ai.request.model = %self.settings.model,
            session = %session,
            gen_ai.usage.input_tokens = field::Empty,
            gen_ai.usage.output_tokens = field::Empty,
            gen_ai.response.finish_reasons = field::Empty,
        );

        let turn = run_turn(
            Arc::clone(&self.provider),
            Arc::clone(&self.tools),
            Arc::clone(&self.settings),
            Arc::clone(&self.sessions),
            session.clone(),
            message,
        );

        Box::pin(StreamInSpan {
            inner: Box::pin(turn),
            span,
        })
    }

    fn reset(&self, session: &SessionId) {
        info!(session = %session, "session history cleared");
        self.sessions.clear(session);
    }
}

/// A requested tool call as it came off the provider stream.
struct ToolCall {
    id: String,
    name: String,
    input: serde_json::Value,
}

/// Everything one model step produced.
#[derive(Default)]
struct StepOutput {
    text: String,
    tool_calls: Vec<ToolCall>,
    stop_reason: Option<StopReason>,
    input_tokens: u64,
    output_tokens: u64,
}

fn run_turn(
    provider: Arc<BoxLlmProvider>,
    tools: Arc<Vec<ToolDefinition>>,
    settings: Arc<AgentSettings>,
    sessions: Arc<SessionStore>,
    session: SessionId,
    message: String,
) -> impl Stream<Item = Result<AgentChunk, AgentError>> + Send {
    async_stream::stream! {
        let mut history = sessions.history(&session);
        history.push(Message::user(message));

        let mut rounds: u32 = 0;
        let mut input_tokens: u64 = 0;
        let mut output_tokens: u64 = 0;

        loop {
            let request = build_request(&settings, provider.capabilities(), &history, &tools);
            let step = match run_step(&provider, request).await {
                Ok(step) => step,
                Err(e) => {
                    yield Err(AgentError::from(e));
                    return;
                }
            };

            input_tokens += step.input_tokens;
            output_tokens += step.output_tokens;
            if let Some(reason) = &step.stop_reason {
                tracing::Span::current().record(GEN_AI_RESPONSE_FINISH_REASONS, field::display(reason));
            }

            let tool_blocks = step
                .tool_calls
                .iter()
                .map(|call| ContentBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.input.clone(),
                })
                .collect::<Vec<_>>();
            let assistant = Message::assistant(&step.text, tool_blocks);
            if !assistant.content.is_empty() {
                history.push(assistant);
            }

            if !step.text.is_empty() {
                yield Ok(AgentChunk::Text(step.text));
            }

            if step.tool_calls.is_empty() {
                break;
            }

            if rounds >= settings.max_tool_rounds {
                yield Err(AgentError::ToolRoundsExceeded { limit: settings.max_tool_rounds });
                return;
            }
            rounds += 1;

            let mut results = Vec::with_capacity(step.tool_calls.len());
            for call in step.tool_calls {
                let invocation = ToolInvocation::from_model_input(&call.name, &call.input);
                let (chunk, reply) = ToolUseChunk::new(invocation);
                yield Ok(AgentChunk::ToolUse(chunk));

                let outcome = reply.await.unwrap_or(Err(ToolError::Cancelled));
                debug!(tool = %call.name, ok = outcome.is_ok(), "tool result received");
                results.push(tool_result_block(call.id, outcome));
            }
            history.push(Message::tool_results(results));
        }

        let span = tracing::Span::current();
        span.record(GEN_AI_USAGE_INPUT_TOKENS, input_tokens);
        span.record(GEN_AI_USAGE_OUTPUT_TOKENS, output_tokens);
        info!(rounds, input_tokens, output_tokens, "turn complete");

        sessions.commit(&session, history);
    }
}

/// Stream one completion and fold its events into a [`StepOutput`].
async fn run_step(provider: &BoxLlmProvider, request: CompletionRequest) -> Result<StepOutput, LlmError> {
    let mut events = provider.stream(request);
    let mut step = StepOutput::default();

    while let Some(event) = events.next().await {
        match event? {
            StreamEvent::TextDelta { text, .. } => step.text.push_str(&text),
            StreamEvent::ToolUseComplete { id, name, input } => {
                step.tool_calls.push(ToolCall { id, name, input });
            }
            StreamEvent::MessageDelta { stop_reason } => step.stop_reason = Some(stop_reason),
            // Later usage reports are cumulative for the same message.
            StreamEvent::Usage(usage) => {
                step.input_tokens = step.input_tokens.max(u64::from(usage.input_tokens));
                step.output_tokens = step.output_tokens.max(u64::from(usage.output_tokens));
            }
            StreamEvent::Done => break,
            StreamEvent::Connected
            | StreamEvent::ContentBlockStart { .. }
            | StreamEvent::ThinkingDelta { .. }
            | StreamEvent::ContentBlockStop { .. } => {}
        }
    }

    debug!(
        text_len = step.text.len(),
        tool_calls = step.tool_calls.len(),
        stop_reason = ?step.stop_reason,
        "model step finished"
    );
    Ok(step)
}

fn tool_result_block(tool_use_id: String, outcome: ToolOutcome) -> ContentBlock {
    match outcome {
        Ok(content) => ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error: false,
        },
        Err(e) => ContentBlock::ToolResult {
            tool_use_id,
            content: e.to_string(),
            is_error: true,
        },
    }
}

/// Build a CompletionRequest from the settings and the running history.
fn build_request(
    settings: &AgentSettings,
    capabilities: &ProviderCapabilities,
    history: &[Message],
    tools: &[ToolDefinition],
) -> CompletionRequest {
    CompletionRequest {
        model: settings.model.clone(),
        messages: history.to_vec(),
        system: settings.system_prompt.clone(),
        max_tokens: settings.max_tokens.min(capabilities.max_output_tokens),
        temperature: settings.temperature,
        stream: true,
        tools: tools.to_vec(),
    }
}

/// A stream wrapper that keeps an OTel span entered while the turn is polled.
///
/// Without this, the span would be dropped immediately after creating the stream,
/// losing the instrumentation for the actual streaming duration.
struct StreamInSpan {
    inner: AgentStream,
    span: tracing::Span,
}

impl Stream for StreamInSpan {
    type Item = Result<AgentChunk, AgentError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let _enter = this.span.enter();
        this.inner.as_mut().poll_next(cx)
    }
}
