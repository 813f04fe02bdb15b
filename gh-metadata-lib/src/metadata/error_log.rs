const LOG_TARGET: &str = "    errors";

/// Append-only list of run-affecting failures.
///
/// Components record what went wrong and carry on; the command reports every message
/// once the pass is over and turns a non-empty log into a failing exit status.
#[derive(Debug, Default)]
pub struct ErrorLog {
    messages: Vec<String>,
}

impl ErrorLog {
    #[must_use]
    pub const fn new() -> Self {
        Self { messages: Vec::new() }
    }

    /// Record a failure. Never fails.
    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!(target: LOG_TARGET, "{message}");
        self.messages.push(message);
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}
