//! Multi-turn session history
//!
//! A `Session` remembers completed turns and replays them on every new
//! question, so follow-ups like "something shorter?" keep their meaning.
//! Failed turns are not recorded.

use sdk::errors::EngineError;
use std::sync::Arc;
use uuid::Uuid;

use super::core::{Orchestrator, TurnOutcome};

/// A completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub user: String,
    pub assistant: String,
}

impl Turn {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

pub struct Session {
    id: String,
    orchestrator: Arc<Orchestrator>,
    turns: Vec<Turn>,
}

impl Session {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            orchestrator,
            turns: Vec::new(),
        }
    }

    /// Identifier written to the response log
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Forget all history
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Ask a question in the context of the previous turns.
    pub async fn ask(&mut self, user_input: &str) -> Result<TurnOutcome, EngineError> {
        let outcome = self
            .orchestrator
            .run_turn(Some(self.id.as_str()), &self.turns, user_input)
            .await?;

        self.turns.push(Turn::new(user_input, outcome.answer.clone()));
        Ok(outcome)
    }
}
