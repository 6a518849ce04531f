//! Chat log entries

use serde::{Deserialize, Serialize};

/// Who produced a chat entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The trainee
    User,
    /// The persona
    Ai,
    /// Notices and errors
    System,
}

impl Role {
    /// Label used when feeding dialogue back to the model
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Ai => "AI",
            Role::System => "System",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::User => "user",
            Role::Ai => "ai",
            Role::System => "system",
        };
        write!(f, "{}", name)
    }
}

/// One entry in the message log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(Role::Ai, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    /// `User: ...` / `AI: ...` form used as Actor context
    pub fn to_prompt_line(&self) -> String {
        format!("{}: {}", self.role.prompt_label(), self.text)
    }
}
