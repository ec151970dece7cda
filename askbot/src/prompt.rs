use serde::{Deserialize, Serialize};

pub const HELPFUL_INSTRUCTION: &str =
    "You are a helpful assistant. Please respond to the user queries.";
pub const FRIENDLY_INSTRUCTION: &str = "You are a friendly and helpful assistant.";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// An ordered message sequence ready to be sent to a chat model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub messages: Vec<Message>,
}

/// A system instruction followed by the user's question.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    instruction: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(HELPFUL_INSTRUCTION)
    }
}

impl PromptTemplate {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
        }
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// The question is inserted as-is; nothing is escaped.
    pub fn render(&self, question: &str) -> Prompt {
        Prompt {
            messages: vec![
                Message {
                    role: Role::System,
                    content: self.instruction.clone(),
                },
                Message {
                    role: Role::User,
                    content: format!("Question: {question}"),
                },
            ],
        }
    }
}
