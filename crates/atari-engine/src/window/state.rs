/// Frame-loop lifecycle.
///
/// ```text
/// Uninitialized ──EnvironmentReady──▶ WindowReady ──ResourcesCreated──▶ Running
///       │                                  │                              │
///       └──EnvironmentFailed──▶ Terminated ◀────────CloseRequested────────┘
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    Uninitialized,
    WindowReady,
    Running,
    Terminated,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopEvent {
    /// Window and GPU context both created.
    EnvironmentReady,
    /// Window or GPU context creation failed.
    EnvironmentFailed,
    /// The app created its shaders and buffers.
    ResourcesCreated,
    /// Close flag set (Escape, window close button, fatal surface error).
    CloseRequested,
}

impl LoopState {
    /// Applies `event`; events that make no sense in the current state leave
    /// it unchanged. `Terminated` is final.
    pub fn next(self, event: LoopEvent) -> LoopState {
        use LoopEvent::*;
        use LoopState::*;

        match (self, event) {
            (Terminated, _) => Terminated,
            (Uninitialized, EnvironmentReady) => WindowReady,
            (Uninitialized, EnvironmentFailed) => Terminated,
            (WindowReady, ResourcesCreated) => Running,
            (_, CloseRequested) => Terminated,
            (state, _) => state,
        }
    }

    pub fn is_running(self) -> bool {
        self == LoopState::Running
    }
}

/// How the loop ended.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ExitStatus {
    /// Window closed normally.
    Normal,
    /// Window or GPU context could not be created.
    EnvironmentFailure,
}

impl ExitStatus {
    /// Process exit code: `0` normal, `-1` environment failure.
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Normal => 0,
            ExitStatus::EnvironmentFailure => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LoopEvent::*;
    use LoopState::*;

    #[test]
    fn happy_path_reaches_running_then_terminates() {
        let s = Uninitialized.next(EnvironmentReady);
        assert_eq!(s, WindowReady);
        let s = s.next(ResourcesCreated);
        assert!(s.is_running());
        assert_eq!(s.next(CloseRequested), Terminated);
    }

    #[test]
    fn environment_failure_terminates_directly() {
        assert_eq!(Uninitialized.next(EnvironmentFailed), Terminated);
    }

    #[test]
    fn terminated_is_final() {
        for ev in [EnvironmentReady, EnvironmentFailed, ResourcesCreated, CloseRequested] {
            assert_eq!(Terminated.next(ev), Terminated);
        }
    }

    #[test]
    fn out_of_order_events_are_ignored() {
        assert_eq!(Uninitialized.next(ResourcesCreated), Uninitialized);
        assert_eq!(Running.next(EnvironmentReady), Running);
        assert_eq!(WindowReady.next(EnvironmentFailed), WindowReady);
    }

    #[test]
    fn exit_codes() {
        assert_eq!(ExitStatus::Normal.code(), 0);
        assert_eq!(ExitStatus::EnvironmentFailure.code(), -1);
    }
}
