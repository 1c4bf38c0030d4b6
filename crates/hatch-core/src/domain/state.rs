//! Dispatch state machine.

use serde::{Deserialize, Serialize};

/// State of one dispatch.
///
/// State transitions:
/// - Pending -> Sent -> SettledSuccess
/// - Pending -> Sent -> SettledFailure
/// - Pending -> SettledFailure (packaging or send failed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchState {
    Pending,
    Sent,
    SettledSuccess,
    SettledFailure,
}

impl DispatchState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DispatchState::SettledSuccess | DispatchState::SettledFailure
        )
    }

    /// Is `next` a legal successor of `self`?
    pub fn can_advance_to(self, next: DispatchState) -> bool {
        use DispatchState::*;
        matches!(
            (self, next),
            (Pending, Sent) | (Pending, SettledFailure) | (Sent, SettledSuccess) | (Sent, SettledFailure)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::send(DispatchState::Pending, DispatchState::Sent, true)]
    #[case::packaging_failure(DispatchState::Pending, DispatchState::SettledFailure, true)]
    #[case::skip_send(DispatchState::Pending, DispatchState::SettledSuccess, false)]
    #[case::reply_ok(DispatchState::Sent, DispatchState::SettledSuccess, true)]
    #[case::reply_err(DispatchState::Sent, DispatchState::SettledFailure, true)]
    #[case::double_settle(DispatchState::SettledSuccess, DispatchState::SettledFailure, false)]
    #[case::resend(DispatchState::Sent, DispatchState::Sent, false)]
    fn transitions(
        #[case] from: DispatchState,
        #[case] to: DispatchState,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_advance_to(to), allowed);
    }

    #[test]
    fn only_settled_states_are_terminal() {
        assert!(!DispatchState::Pending.is_terminal());
        assert!(!DispatchState::Sent.is_terminal());
        assert!(DispatchState::SettledSuccess.is_terminal());
        assert!(DispatchState::SettledFailure.is_terminal());
    }
}
