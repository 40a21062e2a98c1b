//! Terminal transport for the interactive `chat` command

use async_trait::async_trait;
use chat_relay_core::transport::{MessageId, Transport};
use chat_relay_core::{Error, Result};
use console::{measure_text_width, style, Term};
use parking_lot::Mutex;

/// Last message written to the terminal
#[derive(Debug, Clone)]
struct Rendered {
    id: MessageId,
    lines: usize,
    #[cfg_attr(not(test), allow(dead_code))]
    content: String,
    #[cfg_attr(not(test), allow(dead_code))]
    replaced: bool,
}

/// Prints assistant messages to the terminal.
///
/// An update to the most recently printed message rewrites it in place;
/// anything else is printed as a new line. Nothing else may write to the
/// terminal while a chat runs, so logging must stay off the console.
pub struct TerminalTransport {
    term: Term,
    last: Mutex<Option<Rendered>>,
}

impl TerminalTransport {
    pub fn new(term: Term) -> Self {
        Self {
            term,
            last: Mutex::new(None),
        }
    }

    /// Lines to clear before rewriting `id`, if it is still the last message
    fn rewritable_lines(&self, id: &MessageId) -> Option<usize> {
        match &*self.last.lock() {
            Some(last) if &last.id == id => Some(last.lines),
            _ => None,
        }
    }

    /// Forget the last message, e.g. after the user typed a line
    pub fn reset(&self) {
        *self.last.lock() = None;
    }

    fn print(&self, content: &str) -> Result<usize> {
        let text = format!("{} {}", style("Assistant:").bold().green(), content);
        let width = self
            .term
            .size_checked()
            .map(|(_, cols)| cols as usize)
            .unwrap_or(0);
        self.term
            .write_line(&text)
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(rendered_lines(&text, width))
    }

    fn remember(&self, id: &MessageId, lines: usize, content: &str, replaced: bool) {
        *self.last.lock() = Some(Rendered {
            id: id.clone(),
            lines,
            content: content.to_string(),
            replaced,
        });
    }
}

/// Screen rows taken by `text` on a terminal `width` columns wide (0 = no wrapping)
fn rendered_lines(text: &str, width: usize) -> usize {
    text.split('\n')
        .map(|line| {
            let cols = measure_text_width(line);
            if width == 0 || cols == 0 {
                1
            } else {
                cols.div_ceil(width)
            }
        })
        .sum()
}

#[async_trait]
impl Transport for TerminalTransport {
    async fn send(&self, _session_id: &str, content: &str) -> Result<MessageId> {
        let id = MessageId::new();
        let lines = self.print(content)?;
        self.remember(&id, lines, content, false);
        Ok(id)
    }

    async fn update(&self, _session_id: &str, id: &MessageId, content: &str) -> Result<()> {
        let previous = self.rewritable_lines(id);
        if let Some(lines) = previous.filter(|_| self.term.is_term()) {
            self.term
                .clear_last_lines(lines)
                .map_err(|e| Error::Transport(e.to_string()))?;
        }
        let lines = self.print(content)?;
        self.remember(id, lines, content, previous.is_some());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_relay_agent::{ChatHandlers, ModelBinding, RunConfig, ERROR_PREFIX};
    use chat_relay_core::config::AgentConfig;
    use chat_relay_providers::testing::{Scripted, ScriptedProvider};
    use std::sync::Arc;

    fn last(transport: &TerminalTransport) -> Rendered {
        transport.last.lock().clone().unwrap()
    }

    #[tokio::test]
    async fn test_only_last_message_is_rewritable() {
        let transport = TerminalTransport::new(Term::buffered_stdout());
        let first = transport.send("s1", "Thinking...").await.unwrap();
        let second = transport.send("s1", "Thinking...").await.unwrap();

        assert_eq!(transport.rewritable_lines(&second), Some(1));
        assert_eq!(transport.rewritable_lines(&first), None);

        transport
            .update("s1", &first, "line one\nline two")
            .await
            .unwrap();
        assert_eq!(transport.rewritable_lines(&first), Some(2));
        assert!(!last(&transport).replaced);

        transport.reset();
        assert_eq!(transport.rewritable_lines(&first), None);
    }

    #[test]
    fn test_rendered_lines_counts_wrapping() {
        assert_eq!(rendered_lines("short", 80), 1);
        assert_eq!(rendered_lines("short", 0), 1);
        assert_eq!(rendered_lines(&"x".repeat(81), 80), 2);
        assert_eq!(rendered_lines(&"x".repeat(160), 80), 2);
        assert_eq!(rendered_lines("a\n\nb", 80), 3);

        let styled = format!("{} {}", style("Assistant:").bold().green(), "x".repeat(69));
        assert_eq!(rendered_lines(&styled, 80), 1);
    }

    #[tokio::test]
    async fn test_failed_turn_replaces_placeholder_with_error() {
        let provider = Arc::new(ScriptedProvider::with_script([Scripted::Fail(
            "HTTP request failed: connection refused".to_string(),
        )]));
        let handlers = ChatHandlers::with_factory(
            AgentConfig::default(),
            Arc::new(move || -> chat_relay_core::Result<RunConfig> {
                Ok(RunConfig::new(
                    provider.clone(),
                    ModelBinding::new("gemini-2.0-flash"),
                ))
            }),
        );
        let transport = TerminalTransport::new(Term::buffered_stdout());

        handlers.on_chat_start("cli:direct", &transport).await.unwrap();
        transport.reset();

        let reply = handlers
            .on_message("cli:direct", "front desk?", &transport)
            .await
            .unwrap();

        assert!(reply.is_failure());
        let rendered = last(&transport);
        assert!(rendered.replaced);
        assert!(rendered.content.starts_with(ERROR_PREFIX));
        let width = transport
            .term
            .size_checked()
            .map(|(_, cols)| cols as usize)
            .unwrap_or(0);
        let text = format!("{} {}", style("Assistant:").bold().green(), rendered.content);
        assert_eq!(rendered.lines, rendered_lines(&text, width));
        assert!(handlers.store().history("cli:direct").await.unwrap().is_empty());
    }
}
