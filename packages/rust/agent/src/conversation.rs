//! Conversation transcript handed to the reasoning backend.
//!
//! The transcript is append-only: every reasoning step sees the full history
//! of what it said and what the tools returned. Exactly one system message is
//! ever present, and it is always the first entry.

use serde_json::Value;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Standing instructions, seeded once at the start of a run.
    System,
    /// The user's question.
    Human,
    /// A reasoning-backend reply, possibly carrying tool calls.
    Ai,
    /// Output of a tool invocation, tied back to the call that requested it.
    ToolResult,
}

/// A tool call requested by the reasoning backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    /// Provider-assigned call id; echoed back on the matching result.
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// One entry in the transcript.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Populated only on [`Role::Ai`] messages that request tool use.
    pub tool_calls: Vec<ToolCallRequest>,
    /// Populated only on [`Role::ToolResult`] messages.
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn ai(content: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: Role::Ai,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::ToolResult,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }

    /// True when this reply asks for at least one tool invocation.
    pub fn requests_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ConversationState
// ---------------------------------------------------------------------------

/// Append-only transcript for a single run.
#[derive(Debug)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    /// Seed a transcript with the system prompt and the user's question.
    pub fn seed(system_prompt: &str, query: &str) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::human(query)],
        }
    }

    pub fn push(&mut self, message: Message) {
        debug_assert!(
            message.role != Role::System,
            "system message is seeded exactly once"
        );
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_places_system_first() {
        let state = ConversationState::seed("be helpful", "what is a vector store?");
        assert_eq!(state.len(), 2);
        assert_eq!(state.messages()[0].role, Role::System);
        assert_eq!(state.messages()[1].role, Role::Human);
        assert_eq!(state.messages()[1].content, "what is a vector store?");
    }

    #[test]
    fn push_appends_in_order() {
        let mut state = ConversationState::seed("sys", "q");
        state.push(Message::ai("thinking", Vec::new()));
        state.push(Message::tool_result("call_1", "result text"));

        assert_eq!(state.len(), 4);
        assert_eq!(state.messages()[2].role, Role::Ai);
        assert_eq!(state.messages()[3].role, Role::ToolResult);
        assert_eq!(state.messages()[3].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn requests_tools_reflects_tool_calls() {
        let plain = Message::ai("done", Vec::new());
        assert!(!plain.requests_tools());

        let with_call = Message::ai(
            "",
            vec![ToolCallRequest {
                id: "call_1".into(),
                name: "search_docs".into(),
                arguments: serde_json::json!({"query": "agents"}),
            }],
        );
        assert!(with_call.requests_tools());
    }
}
