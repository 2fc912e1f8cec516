//! The agent loop: a small state machine driving reasoning and tool use.
//!
//! A run moves `Start -> Reason`, then alternates `Reason -> Act -> Reason`
//! while the backend keeps requesting tools, and ends when a reply carries
//! no tool calls or the iteration ceiling is hit. Acting always hands
//! control back to reasoning; tools never end a run on their own.

use tracing::{info, instrument, warn};

use docquery_shared::{AgentConfig, Result, RunId};

use crate::conversation::{ConversationState, Message, ToolCallRequest};
use crate::reasoning::ReasoningBackend;
use crate::tools::{ToolInvocation, ToolRuntime, tool_specs};

/// Standing instructions for every run.
const SYSTEM_PROMPT: &str = "\
You are a documentation assistant. Answer the user's question using the \
provided tools to search and read documentation pages. Ground every claim \
in retrieved content and cite the source URLs you relied on. If the \
documentation does not answer the question, say so instead of guessing.";

/// Answer returned when the iteration ceiling is reached before the backend
/// produces a final reply.
const BUDGET_EXHAUSTED_ANSWER: &str =
    "I could not complete the research within the step budget. \
     Try a narrower question.";

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Where the loop goes after a reasoning step.
#[derive(Debug, PartialEq)]
enum Transition {
    /// The reply requested tools; execute them and reason again.
    Act(Vec<ToolCallRequest>),
    /// The reply is the final answer.
    End(String),
}

fn route(reply: &Message) -> Transition {
    if reply.requests_tools() {
        Transition::Act(reply.tool_calls.clone())
    } else {
        Transition::End(reply.content.clone())
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Drives one question to an answer.
pub struct Agent<B> {
    backend: B,
    tools: ToolRuntime,
    config: AgentConfig,
}

impl<B: ReasoningBackend> Agent<B> {
    pub fn new(backend: B, tools: ToolRuntime, config: AgentConfig) -> Self {
        Self {
            backend,
            tools,
            config,
        }
    }

    /// Run the loop for one question.
    ///
    /// Per-tool failures are folded into the transcript as tool results so
    /// the backend can route around them; backend failures end the run.
    #[instrument(skip_all, fields(run_id = %RunId::new()))]
    pub async fn answer(&self, query: &str) -> Result<String> {
        let specs = tool_specs();
        let mut conversation = ConversationState::seed(SYSTEM_PROMPT, query);
        let max_iterations = self.config.max_iterations.max(1);

        for iteration in 1..=max_iterations {
            let reply = self.backend.complete(conversation.messages(), &specs).await?;
            let transition = route(&reply);
            conversation.push(reply);

            match transition {
                Transition::End(answer) => {
                    info!(iteration, "run complete");
                    return Ok(answer);
                }
                Transition::Act(calls) => {
                    info!(iteration, calls = calls.len(), "executing tool calls");
                    for call in calls {
                        let rendered = self.execute(&call).await;
                        conversation.push(Message::tool_result(call.id, rendered));
                    }
                }
            }
        }

        warn!(max_iterations, "iteration ceiling reached");
        Ok(BUDGET_EXHAUSTED_ANSWER.to_string())
    }

    /// Execute one tool call, turning any failure into text for the
    /// transcript.
    async fn execute(&self, call: &ToolCallRequest) -> String {
        let outcome = match ToolInvocation::decode(&call.name, &call.arguments) {
            Ok(invocation) => self.tools.run(invocation).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(text) => text,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "tool call failed");
                format!("Tool '{}' failed: {e}", call.name)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
