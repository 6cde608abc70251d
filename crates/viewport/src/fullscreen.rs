use serde::Serialize;

/// Failure reported by a host presentation call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresentationError {
    #[error("presentation mode not supported: {0}")]
    Unsupported(String),
    #[error("presentation request rejected: {0}")]
    Rejected(String),
}

/// The host surface's presentation controls.
///
/// Each mode change has a primary and a fallback entry point; hosts without
/// a distinct fallback return [`PresentationError::Unsupported`] from it.
pub trait PresentationHost {
    fn is_fullscreen(&self) -> bool;
    fn request_fullscreen(&mut self) -> Result<(), PresentationError>;
    fn request_fullscreen_fallback(&mut self) -> Result<(), PresentationError>;
    fn exit_fullscreen(&mut self) -> Result<(), PresentationError>;
    fn exit_fullscreen_fallback(&mut self) -> Result<(), PresentationError>;
}

/// What a toggle ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FullscreenOutcome {
    Entered { fallback: bool },
    Exited { fallback: bool },
    /// Both attempts failed; presentation is unchanged.
    Unavailable { entering: bool },
}

/// Toggles fullscreen on a [`PresentationHost`], falling back once.
#[derive(Debug, Default, Clone)]
pub struct FullscreenCoordinator {
    toggles: u64,
    failures: u64,
}

impl FullscreenCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip presentation mode. Errors from the host are logged and swallowed.
    ///
    /// The viewport is not touched here: entering or leaving fullscreen makes
    /// the host emit a resize, which reaches the tracker through the normal
    /// event path.
    pub fn toggle_fullscreen(&mut self, host: &mut dyn PresentationHost) -> FullscreenOutcome {
        self.toggles += 1;
        let entering = !host.is_fullscreen();
        let primary = if entering {
            host.request_fullscreen()
        } else {
            host.exit_fullscreen()
        };
        let outcome = match primary {
            Ok(()) => Ok(false),
            Err(err) => {
                tracing::debug!(%err, entering, "primary fullscreen call failed, trying fallback");
                let fallback = if entering {
                    host.request_fullscreen_fallback()
                } else {
                    host.exit_fullscreen_fallback()
                };
                fallback.map(|()| true)
            }
        };
        match outcome {
            Ok(fallback) if entering => FullscreenOutcome::Entered { fallback },
            Ok(fallback) => FullscreenOutcome::Exited { fallback },
            Err(err) => {
                self.failures += 1;
                tracing::debug!(%err, entering, "fullscreen unavailable");
                FullscreenOutcome::Unavailable { entering }
            }
        }
    }

    pub fn toggles(&self) -> u64 {
        self.toggles
    }

    /// Toggles where both the primary and the fallback call failed.
    pub fn failures(&self) -> u64 {
        self.failures
    }
}
