//! Conversation history.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// An append-only transcript that can be wiped wholesale.
#[derive(Debug, Clone, Default)]
pub struct Session {
    turns: Vec<ConversationTurn>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that opens with an assistant greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            turns: vec![ConversationTurn::assistant(greeting)],
        }
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Forget every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_empties_history() {
        let mut session = Session::new();
        session.push(ConversationTurn::user("hi"));
        session.push(ConversationTurn::assistant("hello"));
        assert_eq!(session.len(), 2);

        session.clear();
        assert!(session.is_empty());
    }

    #[test]
    fn test_greeting_is_first_turn() {
        let mut session = Session::with_greeting("Hello!");
        session.push(ConversationTurn::user("my invoice is missing"));
        assert_eq!(session.turns()[0], ConversationTurn::assistant("Hello!"));

        session.clear();
        assert!(session.is_empty());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ConversationTurn::user("x")).unwrap();
        assert_eq!(json, r#"{"role":"user","text":"x"}"#);
    }
}
