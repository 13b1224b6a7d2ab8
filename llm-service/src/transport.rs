//! Wire contract for the model transport.
//!
//! The payload shape follows the Bedrock Anthropic messages API: one user
//! message with a single text content block, a system instruction, and fixed
//! sampling settings (8000 max tokens, temperature 0). The reply is a list of
//! content blocks; the first block must be text, anything else is treated as
//! malformed by the invoker.
//!
//! [`ModelTransport`] is the seam between the invoker and the network: the
//! production implementation is [`crate::bedrock_service::BedrockService`],
//! tests substitute in-memory stubs. Plain `async fn` in the trait, no
//! `async-trait`, no `Box<dyn ...>` — callers are generic over the transport.

use serde::{Deserialize, Serialize};

use crate::error_handler::Result;

/// Bedrock Anthropic API version tag sent with every request.
pub const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Token budget for one analysis reply.
pub const MAX_TOKENS: u32 = 8000;

/// One remote call per analysis request.
#[allow(async_fn_in_trait)]
pub trait ModelTransport {
    /// Sends one invoke request and returns the decoded reply.
    async fn send(&self, request: &InvokeRequest) -> Result<InvokeReply>;
}

/// Request body for a Bedrock `invoke` call.
#[derive(Debug, Clone, Serialize)]
pub struct InvokeRequest {
    pub anthropic_version: &'static str,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system: String,
    pub messages: Vec<Message>,
}

impl InvokeRequest {
    /// Builds the standard single-turn request: one user message carrying the
    /// prompt as a text block, deterministic sampling.
    pub fn new(system: &str, prompt: &str) -> Self {
        Self {
            anthropic_version: ANTHROPIC_VERSION,
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            system: system.to_string(),
            messages: vec![Message {
                role: "user",
                content: vec![ContentBlock::text(prompt)],
            }],
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: &'static str,
    pub content: Vec<ContentBlock>,
}

/// One content block of a message or reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

impl ContentBlock {
    pub fn text(text: &str) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.to_string(),
        }
    }
}

/// Decoded reply body of a Bedrock `invoke` call.
///
/// Only the content blocks are kept; usage metadata is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct InvokeReply {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

impl InvokeReply {
    /// The text of the first content block, if that block is text.
    pub fn first_text(&self) -> Option<&str> {
        self.content
            .first()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_payload_shape() {
        let req = InvokeRequest::new("be terse", "analyze this");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["anthropic_version"], ANTHROPIC_VERSION);
        assert_eq!(json["max_tokens"], 8000);
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["system"], "be terse");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][0]["text"], "analyze this");
    }

    #[test]
    fn first_text_requires_leading_text_block() {
        let reply: InvokeReply =
            serde_json::from_str(r#"{"content":[{"type":"text","text":"hi"}]}"#).unwrap();
        assert_eq!(reply.first_text(), Some("hi"));

        let tool: InvokeReply =
            serde_json::from_str(r#"{"content":[{"type":"tool_use"}]}"#).unwrap();
        assert_eq!(tool.first_text(), None);

        let empty: InvokeReply = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert_eq!(empty.first_text(), None);
    }
}
