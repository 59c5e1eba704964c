//! Line-oriented terminal host.
//!
//! Feeds each input line to the widget as typed text followed by an Enter
//! keypress, then prints whatever bubbles the exchange added to the
//! transcript. The typing marker is never printed because it is gone by the
//! time an exchange settles.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::transport::ChatTransport;
use crate::widget::{ChatWidget, SUBMIT_KEY, SubmitOutcome, UiEvent, bubble_role};
use crate::wire::Role;

/// Totals for a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Exchanges that reached the endpoint or failed trying.
    pub exchanges: usize,
    /// Exchanges that ended in an error bubble.
    pub failures: usize,
}

/// Prints a widget's transcript to a terminal-like writer.
#[derive(Debug)]
pub struct TerminalHost<W> {
    out: W,
    rendered: usize,
}

impl<W: AsyncWrite + Unpin> TerminalHost<W> {
    pub fn new(out: W) -> Self {
        Self { out, rendered: 0 }
    }

    /// Consume the host, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print bubbles appended since the last call.
    pub async fn render_new<T>(&mut self, widget: &ChatWidget<T>) -> std::io::Result<()> {
        let bubbles = widget.transcript().children();
        for bubble in bubbles.iter().skip(self.rendered) {
            let label = match bubble_role(bubble) {
                Some(Role::User) => "you",
                Some(Role::Assistant) => "assistant",
                None => continue,
            };
            let line = format!("{label}> {}\n", bubble.text());
            self.out.write_all(line.as_bytes()).await?;
        }
        self.rendered = bubbles.len();
        self.out.flush().await
    }

    /// Drive `widget` from `input` until end of input.
    pub async fn run<R, T>(
        &mut self,
        widget: &ChatWidget<T>,
        input: R,
    ) -> std::io::Result<SessionSummary>
    where
        R: AsyncBufRead + Unpin,
        T: ChatTransport,
    {
        let mut summary = SessionSummary::default();
        let mut lines = input.lines();

        while let Some(line) = lines.next_line().await? {
            widget.input().set_value(line);
            match widget.dispatch(UiEvent::KeyPress(SUBMIT_KEY.to_string())).await {
                SubmitOutcome::Ignored(_) => continue,
                SubmitOutcome::Replied => summary.exchanges += 1,
                SubmitOutcome::ServerError | SubmitOutcome::TransportFailed => {
                    summary.exchanges += 1;
                    summary.failures += 1;
                }
            }
            self.render_new(widget).await?;
        }

        tracing::info!(
            name: "host.session.finished",
            exchanges = summary.exchanges,
            failures = summary.failures,
            "Input closed"
        );
        Ok(summary)
    }
}
