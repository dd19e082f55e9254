//! Recovery of device-dependent resources after the presentation surface is lost.
//!
//! ```text
//! Ready --present fails--> Lost --resettable--> NeedsReset --reset+reload ok--> Ready
//!                                                   |
//!                                                   +--reset fails--> fatal
//! ```
//!
//! Only rendering resources are released and reloaded here. Keyframes, the
//! visible rectangle and the animation run live in the engine and are never
//! touched by this state machine.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::error::Error;

/// What the presentation surface reports when polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceHealth {
    Ready,
    Lost,
    Resettable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplaySurfaceState {
    Ready,
    Lost,
    NeedsReset,
}

/// Contract the renderer fulfils so the recovery loop can drive it.
pub trait PresentationSurface {
    fn health(&mut self) -> SurfaceHealth;

    /// Drops every device-dependent resource (textures, bind groups).
    fn release_resources(&mut self);

    /// Reapplies the presentation parameters.
    fn reset(&mut self) -> Result<(), Error>;

    /// Recreates device-dependent resources, decoding the image at `path` again.
    fn reload_resources(&mut self, path: &Path) -> Result<(), Error>;
}

/// Result of polling the recovery loop for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStep {
    /// The surface is usable; render this tick.
    Render,
    /// Keep pumping events but do not render.
    Waiting,
}

pub struct RecoveryLoop {
    state: DisplaySurfaceState,
    image_path: PathBuf,
    surface_reset: bool,
    reload_attempts: u32,
}

impl RecoveryLoop {
    pub fn new(image_path: impl Into<PathBuf>) -> Self {
        Self {
            state: DisplaySurfaceState::Ready,
            image_path: image_path.into(),
            surface_reset: false,
            reload_attempts: 0,
        }
    }

    pub fn state(&self) -> DisplaySurfaceState {
        self.state
    }

    /// Reports a failed presentation. Releases resources when leaving `Ready`.
    pub fn present_failed<S: PresentationSurface>(&mut self, surface: &mut S) {
        if self.state == DisplaySurfaceState::Ready {
            self.enter_lost(surface);
        }
    }

    /// Polls surface health once and performs whatever transition it allows.
    ///
    /// Returns `Err(Error::SurfaceResetFailed)` when the surface cannot be reset;
    /// the caller must stop the loop.
    pub fn poll<S: PresentationSurface>(&mut self, surface: &mut S) -> Result<RecoveryStep, Error> {
        let health = surface.health();

        if self.state == DisplaySurfaceState::Ready {
            if health == SurfaceHealth::Ready {
                return Ok(RecoveryStep::Render);
            }
            self.enter_lost(surface);
        }

        if self.state == DisplaySurfaceState::Lost {
            match health {
                SurfaceHealth::Lost => return Ok(RecoveryStep::Waiting),
                SurfaceHealth::Resettable => self.goto(DisplaySurfaceState::NeedsReset),
                SurfaceHealth::Ready => {
                    // Presentation works again on its own; resources still need reloading.
                    self.surface_reset = true;
                    self.goto(DisplaySurfaceState::NeedsReset);
                }
            }
        } else if health == SurfaceHealth::Lost {
            // Lost again while waiting on a reload.
            self.surface_reset = false;
            self.goto(DisplaySurfaceState::Lost);
            return Ok(RecoveryStep::Waiting);
        }

        self.reset_and_reload(surface)
    }

    fn reset_and_reload<S: PresentationSurface>(
        &mut self,
        surface: &mut S,
    ) -> Result<RecoveryStep, Error> {
        if !self.surface_reset {
            if let Err(err) = surface.reset() {
                error!(error = %err, "presentation surface reset failed");
                return Err(match err {
                    Error::SurfaceResetFailed(_) => err,
                    other => Error::SurfaceResetFailed(other.to_string()),
                });
            }
            debug!("presentation surface reset");
            self.surface_reset = true;
        }

        self.reload_attempts += 1;
        match surface.reload_resources(&self.image_path) {
            Ok(()) => {
                info!(
                    attempts = self.reload_attempts,
                    path = %self.image_path.display(),
                    "device resources reloaded"
                );
                self.surface_reset = false;
                self.reload_attempts = 0;
                self.goto(DisplaySurfaceState::Ready);
                Ok(RecoveryStep::Render)
            }
            Err(err) => {
                warn!(
                    attempt = self.reload_attempts,
                    error = %err,
                    "resource reload failed; retrying next tick"
                );
                Ok(RecoveryStep::Waiting)
            }
        }
    }

    fn enter_lost<S: PresentationSurface>(&mut self, surface: &mut S) {
        surface.release_resources();
        self.surface_reset = false;
        self.goto(DisplaySurfaceState::Lost);
    }

    fn goto(&mut self, to: DisplaySurfaceState) {
        if self.state != to {
            info!(from = ?self.state, to = ?to, "display surface state changed");
            self.state = to;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct ScriptedSurface {
        health: VecDeque<SurfaceHealth>,
        reset_ok: bool,
        reload_failures: u32,
        released: u32,
        resets: u32,
        reloads: Vec<PathBuf>,
    }

    impl PresentationSurface for ScriptedSurface {
        fn health(&mut self) -> SurfaceHealth {
            self.health.pop_front().unwrap_or(SurfaceHealth::Ready)
        }

        fn release_resources(&mut self) {
            self.released += 1;
        }

        fn reset(&mut self) -> Result<(), Error> {
            self.resets += 1;
            if self.reset_ok {
                Ok(())
            } else {
                Err(Error::SurfaceResetFailed("device removed".into()))
            }
        }

        fn reload_resources(&mut self, path: &Path) -> Result<(), Error> {
            self.reloads.push(path.to_path_buf());
            if self.reload_failures > 0 {
                self.reload_failures -= 1;
                return Err(Error::SurfaceLost);
            }
            Ok(())
        }
    }

    fn surface(script: &[SurfaceHealth]) -> ScriptedSurface {
        ScriptedSurface {
            health: script.iter().copied().collect(),
            reset_ok: true,
            ..ScriptedSurface::default()
        }
    }

    #[test]
    fn healthy_surface_renders() {
        let mut rl = RecoveryLoop::new("/img.png");
        let mut s = surface(&[]);
        assert_eq!(rl.poll(&mut s).unwrap(), RecoveryStep::Render);
        assert_eq!(s.released, 0);
    }

    #[test]
    fn lost_then_resettable_recovers() {
        use SurfaceHealth::*;
        let mut rl = RecoveryLoop::new("/img.png");
        let mut s = surface(&[Lost, Lost, Resettable]);

        rl.present_failed(&mut s);
        assert_eq!(rl.state(), DisplaySurfaceState::Lost);
        assert_eq!(s.released, 1);

        assert_eq!(rl.poll(&mut s).unwrap(), RecoveryStep::Waiting);
        assert_eq!(rl.poll(&mut s).unwrap(), RecoveryStep::Waiting);
        assert_eq!(rl.poll(&mut s).unwrap(), RecoveryStep::Render);
        assert_eq!(rl.state(), DisplaySurfaceState::Ready);
        assert_eq!(s.resets, 1);
        assert_eq!(s.reloads, vec![PathBuf::from("/img.png")]);
    }

    #[test]
    fn reset_failure_is_fatal() {
        let mut rl = RecoveryLoop::new("/img.png");
        let mut s = surface(&[SurfaceHealth::Resettable]);
        s.reset_ok = false;
        rl.present_failed(&mut s);
        let err = rl.poll(&mut s).unwrap_err();
        assert!(matches!(err, Error::SurfaceResetFailed(_)));
        assert!(s.reloads.is_empty());
    }

    #[test]
    fn failed_reload_retries_without_resetting_again() {
        use SurfaceHealth::*;
        let mut rl = RecoveryLoop::new("/img.png");
        let mut s = surface(&[Resettable, Resettable, Resettable]);
        s.reload_failures = 2;
        rl.present_failed(&mut s);

        assert_eq!(rl.poll(&mut s).unwrap(), RecoveryStep::Waiting);
        assert_eq!(rl.state(), DisplaySurfaceState::NeedsReset);
        assert_eq!(rl.poll(&mut s).unwrap(), RecoveryStep::Waiting);
        assert_eq!(rl.poll(&mut s).unwrap(), RecoveryStep::Render);
        assert_eq!(s.resets, 1);
        assert_eq!(s.reloads.len(), 3);
    }

    #[test]
    fn present_failure_only_releases_once() {
        let mut rl = RecoveryLoop::new("/img.png");
        let mut s = surface(&[]);
        rl.present_failed(&mut s);
        rl.present_failed(&mut s);
        assert_eq!(s.released, 1);
    }

    #[test]
    fn health_loss_detected_while_ready() {
        let mut rl = RecoveryLoop::new("/img.png");
        let mut s = surface(&[SurfaceHealth::Lost]);
        assert_eq!(rl.poll(&mut s).unwrap(), RecoveryStep::Waiting);
        assert_eq!(rl.state(), DisplaySurfaceState::Lost);
        assert_eq!(s.released, 1);
    }
}
