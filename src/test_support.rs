//! Scripted provider for unit tests

use crate::error::AppError;
use crate::provider::{
    FragmentStream, ProviderClient, ProviderId, ProviderReply, StreamEvent, TextRequest,
    ToolInvocation, ToolRequest,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Provider that replays canned events and replies and records every request
pub(crate) struct ScriptedProvider {
    provider: ProviderId,
    events: Vec<Result<StreamEvent, String>>,
    replies: Mutex<VecDeque<Result<ProviderReply, String>>>,
    stream_calls: AtomicUsize,
    tool_calls: AtomicUsize,
    text_requests: Mutex<Vec<TextRequest>>,
    tool_requests: Mutex<Vec<ToolRequest>>,
}

impl ScriptedProvider {
    pub(crate) fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            events: Vec::new(),
            replies: Mutex::new(VecDeque::new()),
            stream_calls: AtomicUsize::new(0),
            tool_calls: AtomicUsize::new(0),
            text_requests: Mutex::new(Vec::new()),
            tool_requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_fragments(self, fragments: &[&str]) -> Self {
        self.with_events(
            fragments
                .iter()
                .map(|f| Ok(StreamEvent::Fragment(f.to_string())))
                .collect(),
        )
    }

    /// Errors are replayed as transport errors carrying the same message
    pub(crate) fn with_events(mut self, events: Vec<Result<StreamEvent, AppError>>) -> Self {
        self.events = events
            .into_iter()
            .map(|e| e.map_err(|err| err.to_string()))
            .collect();
        self
    }

    pub(crate) fn with_text_reply(self, text: &str) -> Self {
        self.push_reply(Ok(ProviderReply {
            text: text.to_string(),
            tool_calls: Vec::new(),
        }));
        self
    }

    pub(crate) fn with_tool_reply(self, text: &str, calls: Vec<(&str, serde_json::Value)>) -> Self {
        self.push_reply(Ok(ProviderReply {
            text: text.to_string(),
            tool_calls: calls
                .into_iter()
                .map(|(name, arguments)| ToolInvocation {
                    name: name.to_string(),
                    arguments,
                })
                .collect(),
        }));
        self
    }

    pub(crate) fn with_failure(self, message: &str) -> Self {
        self.push_reply(Err(message.to_string()));
        self
    }

    fn push_reply(&self, reply: Result<ProviderReply, String>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub(crate) fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn tool_calls(&self) -> usize {
        self.tool_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_text_request(&self) -> Option<TextRequest> {
        self.text_requests.lock().unwrap().last().cloned()
    }

    pub(crate) fn tool_requests(&self) -> Vec<ToolRequest> {
        self.tool_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    fn provider(&self) -> ProviderId {
        self.provider
    }

    async fn stream_text(&self, request: &TextRequest) -> Result<FragmentStream, AppError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.text_requests.lock().unwrap().push(request.clone());
        let events: Vec<Result<StreamEvent, AppError>> = self
            .events
            .iter()
            .cloned()
            .map(|e| e.map_err(AppError::Transport))
            .collect();
        Ok(Box::pin(futures_util::stream::iter(events)))
    }

    async fn complete_with_tools(&self, request: &ToolRequest) -> Result<ProviderReply, AppError> {
        self.tool_calls.fetch_add(1, Ordering::SeqCst);
        self.tool_requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(AppError::Transport(message)),
            None => Ok(ProviderReply::default()),
        }
    }
}
