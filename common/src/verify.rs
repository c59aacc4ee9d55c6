#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyPhase {
    Idle,
    CapturingBefore,
    Sending,
    Settling,
    CapturingAfter,
    Confirmed,
    NotConfirmed,
    TransportFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Done,
    Failed,
    Verified(bool),
}

impl VerifyPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::CapturingBefore => "CAPTURING_BEFORE",
            Self::Sending => "SENDING",
            Self::Settling => "SETTLING",
            Self::CapturingAfter => "CAPTURING_AFTER",
            Self::Confirmed => "CONFIRMED",
            Self::NotConfirmed => "NOT_CONFIRMED",
            Self::TransportFailed => "TRANSPORT_FAILED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Confirmed | Self::NotConfirmed | Self::TransportFailed
        )
    }

    pub fn advance(self, result: StepResult) -> Self {
        match (self, result) {
            (Self::Idle, _) => Self::CapturingBefore,
            (Self::CapturingBefore | Self::Sending | Self::CapturingAfter, StepResult::Failed) => {
                Self::TransportFailed
            }
            (Self::CapturingBefore, _) => Self::Sending,
            (Self::Sending, _) => Self::Settling,
            // The settle wait cannot fail.
            (Self::Settling, _) => Self::CapturingAfter,
            (Self::CapturingAfter, StepResult::Verified(true)) => Self::Confirmed,
            (Self::CapturingAfter, _) => Self::NotConfirmed,
            (terminal, _) => terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(steps: &[StepResult]) -> Vec<VerifyPhase> {
        let mut phase = VerifyPhase::Idle;
        let mut visited = vec![phase];
        for step in steps {
            phase = phase.advance(*step);
            visited.push(phase);
        }
        visited
    }

    #[test]
    fn happy_path_reaches_confirmed() {
        let visited = run(&[
            StepResult::Done,
            StepResult::Done,
            StepResult::Done,
            StepResult::Done,
            StepResult::Verified(true),
        ]);

        assert_eq!(
            visited,
            vec![
                VerifyPhase::Idle,
                VerifyPhase::CapturingBefore,
                VerifyPhase::Sending,
                VerifyPhase::Settling,
                VerifyPhase::CapturingAfter,
                VerifyPhase::Confirmed,
            ]
        );
    }

    #[test]
    fn mismatch_after_settle_is_not_confirmed() {
        let phase = VerifyPhase::CapturingAfter.advance(StepResult::Verified(false));
        assert_eq!(phase, VerifyPhase::NotConfirmed);
        assert!(phase.is_terminal());
    }

    #[test]
    fn failure_skips_remaining_phases() {
        assert_eq!(
            VerifyPhase::CapturingBefore.advance(StepResult::Failed),
            VerifyPhase::TransportFailed
        );
        assert_eq!(
            VerifyPhase::Sending.advance(StepResult::Failed),
            VerifyPhase::TransportFailed
        );
        assert_eq!(
            VerifyPhase::CapturingAfter.advance(StepResult::Failed),
            VerifyPhase::TransportFailed
        );
    }

    #[test]
    fn terminal_phases_are_sticky() {
        for phase in [
            VerifyPhase::Confirmed,
            VerifyPhase::NotConfirmed,
            VerifyPhase::TransportFailed,
        ] {
            assert_eq!(phase.advance(StepResult::Done), phase);
            assert_eq!(phase.advance(StepResult::Failed), phase);
        }
    }
}
