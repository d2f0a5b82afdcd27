/// Requests for the session driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    TogglePause,
    /// Advance now instead of waiting for the countdown.
    Skip,
}

/// Requests for the status poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanionCommand {
    PlayPause,
    SkipNext,
    ToggleOverlay,
}
