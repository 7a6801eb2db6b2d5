//! Flash and session message sinks.
//!
//! Message storage belongs to the host application (usually its own session
//! layer). The host inserts a [`MessageHandle`] into the request extensions
//! and the orchestrator writes flash messages, appends session messages, and
//! reads the pending "return to" target through it.

use std::sync::Arc;

use parking_lot::Mutex;

/// Storage for user-facing messages that outlive the current request.
pub trait MessageSink: Send + Sync {
    /// Record a flash message of the given kind (`"error"`, `"success"`, ...).
    fn flash(&self, kind: &str, message: &str);

    /// Append a message to the session's message list.
    fn push_message(&self, message: String);

    /// Take the URL the user originally asked for, clearing it.
    fn take_return_to(&self) -> Option<String>;
}

/// Request extension carrying the host's message sink.
#[derive(Clone)]
pub struct MessageHandle(pub Arc<dyn MessageSink>);

impl MessageHandle {
    pub fn new(sink: impl MessageSink + 'static) -> Self {
        Self(Arc::new(sink))
    }
}

impl std::fmt::Debug for MessageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MessageHandle")
    }
}

/// A flash message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Default)]
struct MemoryMessagesInner {
    flashes: Vec<Flash>,
    messages: Vec<String>,
    return_to: Option<String>,
}

/// In-memory message sink, for tests and single-process demos.
#[derive(Debug, Default, Clone)]
pub struct MemoryMessages {
    inner: Arc<Mutex<MemoryMessagesInner>>,
}

impl MemoryMessages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the URL to return to after a successful login.
    pub fn set_return_to(&self, url: impl Into<String>) {
        self.inner.lock().return_to = Some(url.into());
    }

    /// Flash messages recorded so far.
    pub fn flashes(&self) -> Vec<Flash> {
        self.inner.lock().flashes.clone()
    }

    /// Session messages recorded so far.
    pub fn messages(&self) -> Vec<String> {
        self.inner.lock().messages.clone()
    }

    /// Pending return-to URL, without clearing it.
    pub fn return_to(&self) -> Option<String> {
        self.inner.lock().return_to.clone()
    }
}

impl MessageSink for MemoryMessages {
    fn flash(&self, kind: &str, message: &str) {
        self.inner.lock().flashes.push(Flash {
            kind: kind.to_string(),
            message: message.to_string(),
        });
    }

    fn push_message(&self, message: String) {
        self.inner.lock().messages.push(message);
    }

    fn take_return_to(&self) -> Option<String> {
        self.inner.lock().return_to.take()
    }
}
