use crate::bookings::error::BookingError;
use crate::bookings::BookingStatus;

/// Service for managing booking status transitions
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Pending → Confirmed, Cancelled
    /// - Confirmed → Cancelled, Completed
    /// - Cancelled → (terminal)
    /// - Completed → (terminal)
    pub fn is_valid_transition(from: BookingStatus, to: BookingStatus) -> bool {
        match (from, to) {
            (BookingStatus::Pending, BookingStatus::Confirmed) => true,
            (BookingStatus::Pending, BookingStatus::Cancelled) => true,
            (BookingStatus::Confirmed, BookingStatus::Cancelled) => true,
            (BookingStatus::Confirmed, BookingStatus::Completed) => true,
            _ => false,
        }
    }

    /// Attempt to transition from one status to another
    ///
    /// Cancelling an already-cancelled booking is rejected with a
    /// distinct `AlreadyCancelled` error rather than a silent success.
    pub fn transition(
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<BookingStatus, BookingError> {
        if from == BookingStatus::Cancelled && to == BookingStatus::Cancelled {
            return Err(BookingError::AlreadyCancelled);
        }
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(BookingError::InvalidTransition(format!(
                "Invalid status transition from {} to {}",
                from, to
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_to_confirmed() {
        assert!(StatusMachine::is_valid_transition(
            BookingStatus::Pending,
            BookingStatus::Confirmed
        ));
    }

    #[test]
    fn test_pending_to_cancelled() {
        assert!(StatusMachine::is_valid_transition(
            BookingStatus::Pending,
            BookingStatus::Cancelled
        ));
    }

    #[test]
    fn test_confirmed_to_cancelled() {
        assert!(StatusMachine::is_valid_transition(
            BookingStatus::Confirmed,
            BookingStatus::Cancelled
        ));
    }

    #[test]
    fn test_confirmed_to_completed() {
        assert!(StatusMachine::is_valid_transition(
            BookingStatus::Confirmed,
            BookingStatus::Completed
        ));
    }

    #[test]
    fn test_pending_to_completed_is_invalid() {
        assert!(!StatusMachine::is_valid_transition(
            BookingStatus::Pending,
            BookingStatus::Completed
        ));
    }

    #[test]
    fn test_no_transitions_from_cancelled() {
        for to in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Completed,
        ] {
            assert!(!StatusMachine::is_valid_transition(
                BookingStatus::Cancelled,
                to
            ));
        }
    }

    #[test]
    fn test_no_transitions_from_completed() {
        for to in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
        ] {
            assert!(!StatusMachine::is_valid_transition(
                BookingStatus::Completed,
                to
            ));
        }
    }

    #[test]
    fn test_cancel_already_cancelled_is_rejected() {
        let result =
            StatusMachine::transition(BookingStatus::Cancelled, BookingStatus::Cancelled);
        assert!(matches!(result, Err(BookingError::AlreadyCancelled)));
    }

    #[test]
    fn test_transition_valid() {
        let result = StatusMachine::transition(BookingStatus::Pending, BookingStatus::Confirmed);
        assert_eq!(result.unwrap(), BookingStatus::Confirmed);
    }

    #[test]
    fn test_transition_invalid() {
        let result = StatusMachine::transition(BookingStatus::Pending, BookingStatus::Completed);
        assert!(matches!(result, Err(BookingError::InvalidTransition(_))));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn booking_status_strategy() -> impl Strategy<Value = BookingStatus> {
        prop_oneof![
            Just(BookingStatus::Pending),
            Just(BookingStatus::Confirmed),
            Just(BookingStatus::Cancelled),
            Just(BookingStatus::Completed),
        ]
    }

    /// Cancelled and Completed are terminal states
    #[test]
    fn prop_terminal_states_have_no_exits() {
        proptest!(|(to in booking_status_strategy())| {
            prop_assert!(!StatusMachine::is_valid_transition(BookingStatus::Cancelled, to));
            prop_assert!(!StatusMachine::is_valid_transition(BookingStatus::Completed, to));
        });
    }

    /// transition() and is_valid_transition() agree on every pair,
    /// except the cancelled→cancelled case which maps to AlreadyCancelled
    #[test]
    fn prop_transition_consistency() {
        proptest!(|(
            from in booking_status_strategy(),
            to in booking_status_strategy()
        )| {
            let result = StatusMachine::transition(from, to);
            if from == BookingStatus::Cancelled && to == BookingStatus::Cancelled {
                prop_assert!(matches!(result, Err(BookingError::AlreadyCancelled)));
            } else if StatusMachine::is_valid_transition(from, to) {
                prop_assert_eq!(result.unwrap(), to);
            } else {
                prop_assert!(matches!(result, Err(BookingError::InvalidTransition(_))));
            }
        });
    }

    /// Any non-terminal state can be cancelled
    #[test]
    fn prop_active_states_can_cancel() {
        for from in [BookingStatus::Pending, BookingStatus::Confirmed] {
            assert!(StatusMachine::is_valid_transition(from, BookingStatus::Cancelled));
        }
    }
}
