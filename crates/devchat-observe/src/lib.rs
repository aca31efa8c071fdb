//! Observability for devchat: tracing subscriber setup and OTel GenAI
//! attribute names shared by the agent and provider spans.

pub mod genai_attrs;
pub mod tracing_setup;
