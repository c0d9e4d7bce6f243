//! Scripted transport for session tests

use std::collections::VecDeque;

use crate::transport::{Transport, TransportError};

/// Transport answering from a fixed list of response lines
///
/// Once the script runs out every transaction times out.
pub(crate) struct ScriptedTransport {
    replies: VecDeque<String>,
    sent: Vec<String>,
    fail_open: bool,
}

impl ScriptedTransport {
    pub(crate) fn new(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.to_string()).collect(),
            sent: Vec::new(),
            fail_open: false,
        }
    }

    pub(crate) fn fail_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub(crate) fn push(&mut self, reply: &str) {
        self.replies.push_back(reply.to_string());
    }

    pub(crate) fn sent(&self) -> &[String] {
        &self.sent
    }

    pub(crate) fn clear_sent(&mut self) {
        self.sent.clear();
    }
}

impl Transport for ScriptedTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.fail_open {
            return Err(TransportError::Open("no such device".to_string()));
        }
        Ok(())
    }

    fn send_line(&mut self, line: &str) -> Result<String, TransportError> {
        self.sent.push(line.to_string());
        self.replies.pop_front().ok_or(TransportError::Timeout)
    }
}
