//! AI completion source that replays scripted answers.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{AiCompletionError, AiCompletionSource, CompletionRequest};

/// Replays queued answers in order, then repeats `fallback`.
pub struct ScriptedAiSource {
    queue: Mutex<VecDeque<Result<String, AiCompletionError>>>,
    fallback: Result<String, AiCompletionError>,
    prompts: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedAiSource {
    /// Source that answers every request with `fallback`.
    pub fn always(fallback: Result<String, AiCompletionError>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Source that simulates a network failure on every call.
    pub fn failing() -> Self {
        Self::always(Err(AiCompletionError::transport("connection reset")))
    }

    /// Queue one answer ahead of the fallback.
    pub fn push(&self, answer: Result<String, AiCompletionError>) {
        match self.queue.lock() {
            Ok(mut queue) => queue.push_back(answer),
            Err(_) => panic!("scripted ai queue mutex"),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        match self.prompts.lock() {
            Ok(prompts) => prompts.clone(),
            Err(_) => panic!("scripted ai prompt mutex"),
        }
    }
}

#[async_trait]
impl AiCompletionSource for ScriptedAiSource {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AiCompletionError> {
        match self.prompts.lock() {
            Ok(mut prompts) => prompts.push(request.clone()),
            Err(_) => panic!("scripted ai prompt mutex"),
        }
        let next = match self.queue.lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(_) => panic!("scripted ai queue mutex"),
        };
        next.unwrap_or_else(|| self.fallback.clone())
    }
}
