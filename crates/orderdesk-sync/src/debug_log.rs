/// Messages collected during one pipeline call and returned to the caller
/// as `debugMessages`. Each message is also emitted as a `tracing` event.
#[derive(Debug, Clone)]
pub struct DebugLog {
    operation: &'static str,
    messages: Vec<String>,
}

impl DebugLog {
    #[must_use]
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            messages: Vec::new(),
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(operation = self.operation, "{message}");
        self.messages.push(message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(operation = self.operation, "{message}");
        self.messages.push(format!("warning: {message}"));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(operation = self.operation, "{message}");
        self.messages.push(format!("error: {message}"));
    }

    /// Appends messages already emitted elsewhere, without re-logging them.
    pub fn extend(&mut self, messages: impl IntoIterator<Item = String>) {
        self.messages.extend(messages);
    }

    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    #[must_use]
    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_warnings_and_errors() {
        let mut log = DebugLog::new("import");
        log.info("fetched page 1");
        log.warn("skipped order #1001: cancelled");
        log.error("shopify returned 500");

        assert_eq!(
            log.into_messages(),
            vec![
                "fetched page 1".to_string(),
                "warning: skipped order #1001: cancelled".to_string(),
                "error: shopify returned 500".to_string(),
            ]
        );
    }

    #[test]
    fn extend_keeps_order() {
        let mut log = DebugLog::new("refresh");
        log.info("cleanup done");
        log.extend(vec!["page 1".to_string(), "page 2".to_string()]);
        assert_eq!(log.messages().len(), 3);
        assert_eq!(log.messages()[2], "page 2");
        assert_eq!(log.operation(), "refresh");
    }
}
