//! Host-side chat contract types.

use serde::{Deserialize, Serialize};

use crate::wire;

/// Role of a conversation turn in the host's data model.
///
/// The host contract is open-ended; roles this provider does not recognize
/// decode into [`ChatRole::Other`] and are rejected at translation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Conversation-level instruction, not part of the turn exchange.
    System,
    /// End-user message.
    User,
    /// Model (assistant) message.
    Model,
    /// Any role outside the recognized set.
    #[serde(untagged)]
    Other(String),
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRole::System => f.write_str("system"),
            ChatRole::User => f.write_str("user"),
            ChatRole::Model => f.write_str("model"),
            ChatRole::Other(role) => f.write_str(role),
        }
    }
}

/// One turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who produced the turn.
    pub role: ChatRole,
    /// Plain text of the turn.
    pub text: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(ChatRole::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(ChatRole::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Model, text)
    }
}

/// A full conversation to send, in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatInput {
    messages: Vec<ChatMessage>,
}

impl ChatInput {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }
}

/// Input accepted by [`chat`](crate::GeminiProvider::chat).
///
/// The host contract allows a raw string, a pre-formatted provider payload,
/// or a structured conversation. Only the structured form goes through role
/// validation and translation; the other two are forwarded as-is.
#[derive(Debug, Clone)]
pub enum ChatPayload {
    /// A bare prompt, sent as a single user turn.
    Text(String),
    /// Provider-formatted contents passed through untouched.
    Contents(Vec<wire::Content>),
    /// A structured conversation to translate.
    Conversation(ChatInput),
}

impl From<&str> for ChatPayload {
    fn from(text: &str) -> Self {
        ChatPayload::Text(text.to_owned())
    }
}

impl From<ChatInput> for ChatPayload {
    fn from(input: ChatInput) -> Self {
        ChatPayload::Conversation(input)
    }
}

/// Operation types a provider can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Chat,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Chat => "chat",
        }
    }
}

/// Normalized chat reply.
#[derive(Debug, Clone)]
pub struct ChatOutput {
    /// The generated turn. `text` is the empty string when the provider
    /// returned no content parts.
    pub message: ChatMessage,
    /// Untouched provider response, for callers needing vendor fields.
    pub raw: wire::GenerateContentResponse,
    /// Auxiliary metadata; currently always empty.
    pub metadata: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&ChatRole::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&ChatRole::Model).unwrap(), "\"model\"");
        let role: ChatRole = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, ChatRole::User);
    }

    #[test]
    fn test_unrecognized_role_decodes_as_other() {
        let role: ChatRole = serde_json::from_str("\"tool\"").unwrap();
        assert_eq!(role, ChatRole::Other("tool".into()));
        assert_eq!(role.to_string(), "tool");
    }

    #[test]
    fn test_conversation_order_preserved() {
        let input = ChatInput::new(vec![
            ChatMessage::user("first"),
            ChatMessage::model("second"),
            ChatMessage::user("third"),
        ]);
        let texts: Vec<_> = input.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
    }

    #[test]
    fn test_payload_from_str() {
        let payload = ChatPayload::from("hello");
        assert!(matches!(payload, ChatPayload::Text(ref t) if t == "hello"));
    }
}
