//! Per-instance widget state.

use crate::wire::ConversationHistory;

/// Where the widget is in its exchange cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExchangePhase {
    /// Ready to accept a submission.
    #[default]
    Idle,
    /// A request is in flight; further submissions are refused.
    AwaitingResponse,
}

/// State owned by one widget instance.
#[derive(Debug, Default)]
pub(crate) struct WidgetState {
    pub(crate) history: ConversationHistory,
    pub(crate) phase: ExchangePhase,
}

impl WidgetState {
    /// Claim the single exchange slot, returning the history to send.
    ///
    /// Returns `None` if an exchange is already in flight.
    pub(crate) fn begin_exchange(&mut self) -> Option<ConversationHistory> {
        if self.phase == ExchangePhase::AwaitingResponse {
            return None;
        }
        self.phase = ExchangePhase::AwaitingResponse;
        Some(self.history.clone())
    }

    pub(crate) fn end_exchange(&mut self) {
        self.phase = ExchangePhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_flight() {
        let mut state = WidgetState::default();
        assert!(state.begin_exchange().is_some());
        assert!(state.begin_exchange().is_none());

        state.end_exchange();
        assert_eq!(state.phase, ExchangePhase::Idle);
        assert!(state.begin_exchange().is_some());
    }
}
