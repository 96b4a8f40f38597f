//! Mock transport for testing
//!
//! Replays canned responses in order and records every request it sees,
//! so tests can check both what was sent and how many calls were made.

use std::cell::RefCell;
use std::collections::VecDeque;

use super::{ApiRequest, ApiResponse, Transport, TransportError};

type Canned = Result<ApiResponse, TransportError>;

#[derive(Default)]
pub struct MockTransport {
    responses: RefCell<VecDeque<Canned>>,
    calls: RefCell<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body.
    pub fn respond(self, status: u16, body: &str) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Ok(ApiResponse::new(status, body)));
        self
    }

    /// Queue a 200 response.
    pub fn ok(self, body: &str) -> Self {
        self.respond(200, body)
    }

    /// Queue a network-level failure.
    pub fn fail(self, message: &str) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Err(TransportError(message.to_string())));
        self
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// URLs of the recorded calls, in order.
    pub fn urls(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.url.clone()).collect()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.calls.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError("no canned response left".to_string())))
    }
}
