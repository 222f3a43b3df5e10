//! Conversation Orchestrator
//!
//! Runs one turn of the recommendation conversation:
//!
//! 1. Retrieve context for the user utterance and render it as a system message
//! 2. First completion with the summary tool attached (`tool_choice: auto`)
//! 3. No tool calls: return the reply as the answer
//! 4. Otherwise execute every `get_summary_by_title` call and append the
//!    results, correlated by call id
//! 5. Final completion over the extended transcript (`tool_choice: none`)
//!
//! At most two completion calls per turn, each under a timeout. The
//! orchestrator holds no conversation state; history is passed in.

use sdk::errors::EngineError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::index::SemanticIndex;
use crate::llm::{
    Completion, CompletionProvider, CompletionRequest, Message, ToolCall, ToolChoice, Usage,
};
use crate::response_log::ResponseLogger;
use crate::tools::ToolRegistry;

use super::context::{render_context, SYSTEM_PROMPT};
use super::session::Turn;

/// Default number of retrieval hits per user message
pub const DEFAULT_TOP_K: usize = 5;

/// Default timeout for each completion call in seconds
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// What a turn produced
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Final assistant text; empty if the service returned no content
    pub answer: String,

    /// Model reported by the last completion
    pub model: String,

    /// Token usage of the last completion
    pub usage: Option<Usage>,

    /// Tool invocations requested by the first completion
    pub tool_calls: Vec<ToolCall>,
}

impl TurnOutcome {
    fn from_completion(completion: Completion, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            answer: completion.text(),
            model: completion.model,
            usage: completion.usage,
            tool_calls,
        }
    }

    pub fn used_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

pub struct Orchestrator {
    index: Arc<dyn SemanticIndex>,
    provider: Arc<dyn CompletionProvider>,
    tools: Arc<ToolRegistry>,
    logger: Arc<ResponseLogger>,
    top_k: usize,
    llm_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        index: Arc<dyn SemanticIndex>,
        provider: Arc<dyn CompletionProvider>,
        tools: Arc<ToolRegistry>,
        logger: Arc<ResponseLogger>,
    ) -> Self {
        Self {
            index,
            provider,
            tools,
            logger,
            top_k: DEFAULT_TOP_K,
            llm_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
        }
    }

    /// Number of hits retrieved per user message
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Timeout applied to each completion call
    pub fn with_timeout(mut self, llm_timeout: Duration) -> Self {
        self.llm_timeout = llm_timeout;
        self
    }

    pub fn provider(&self) -> &dyn CompletionProvider {
        self.provider.as_ref()
    }

    /// Answer a single utterance with no prior history.
    pub async fn ask(&self, user_input: &str) -> Result<TurnOutcome, EngineError> {
        self.run_turn(None, &[], user_input).await
    }

    /// Run one turn on top of `history`.
    ///
    /// # Errors
    /// * `EngineError::Transport` if the index or completion service is unreachable
    /// * `EngineError::LLMTimeout` if a completion exceeds the timeout
    /// * `EngineError::ToolArgument` if the model sends malformed tool arguments
    pub async fn run_turn(
        &self,
        session_id: Option<&str>,
        history: &[Turn],
        user_input: &str,
    ) -> Result<TurnOutcome, EngineError> {
        info!("Starting turn ({} prior turn(s))", history.len());

        let mut transcript = self.build_transcript(history, user_input).await?;
        let tools = self.tools.schemas();

        let first = self
            .complete(CompletionRequest::new(&transcript).with_tools(tools, ToolChoice::Auto))
            .await?;

        if !first.has_tool_calls() {
            debug!("Direct answer, no tool calls");
            self.logger.record(session_id, user_input, &first);
            return Ok(TurnOutcome::from_completion(first, Vec::new()));
        }

        for call in &first.tool_calls {
            debug!("Tool call: {} ({})", call.name, call.id);
        }

        let results = self.tools.dispatch(&first.tool_calls)?;
        transcript.push(first.to_message());
        transcript.extend(results);

        let final_completion = self
            .complete(CompletionRequest::new(&transcript).with_tools(tools, ToolChoice::None))
            .await?;

        self.logger.record(session_id, user_input, &final_completion);
        Ok(TurnOutcome::from_completion(final_completion, first.tool_calls))
    }

    /// System instruction, then each user message followed by its freshly
    /// retrieved context, with prior assistant replies in between.
    async fn build_transcript(
        &self,
        history: &[Turn],
        user_input: &str,
    ) -> Result<Vec<Message>, EngineError> {
        let mut transcript = Vec::with_capacity(history.len() * 3 + 3);
        transcript.push(Message::system(SYSTEM_PROMPT));

        for turn in history {
            transcript.push(Message::user(&turn.user));
            transcript.push(Message::system(self.context_for(&turn.user).await?));
            transcript.push(Message::assistant(&turn.assistant));
        }

        transcript.push(Message::user(user_input));
        transcript.push(Message::system(self.context_for(user_input).await?));
        Ok(transcript)
    }

    async fn context_for(&self, text: &str) -> Result<String, EngineError> {
        let hits = self.index.retrieve(text, self.top_k).await?;
        debug!("Context built from {} hit(s)", hits.len());
        Ok(render_context(&hits))
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion, EngineError> {
        match timeout(self.llm_timeout, self.provider.complete(request)).await {
            Ok(Ok(completion)) => Ok(completion),
            Ok(Err(e)) => {
                error!("Completion call failed: {}", e);
                Err(e.into())
            }
            Err(_) => {
                error!(
                    "Completion call timed out after {}s",
                    self.llm_timeout.as_secs()
                );
                Err(EngineError::LLMTimeout)
            }
        }
    }
}
