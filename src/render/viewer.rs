//! Window and event loop driving the engine one tick per redraw.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowAttributes, WindowId},
};

use crate::{
    config::Configuration,
    engine::{
        Engine,
        clock::{FrameTimer, SystemClock},
        recovery::{DisplaySurfaceState, RecoveryLoop, RecoveryStep},
    },
    processing::rect::Size,
    render::{
        gpu::{Gpu, PresentOutcome},
        input::InputTracker,
    },
};

/// How often surface health is polled while presentation is unavailable.
const RECOVERY_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug)]
enum ViewerEvent {
    Cancelled,
}

struct ViewerApp {
    cfg: Configuration,
    cancel: CancellationToken,
    image_path: PathBuf,
    image_size: Size,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    engine: Option<Engine>,
    recovery: RecoveryLoop,
    input: InputTracker,
    timer: FrameTimer,
    fatal: Option<anyhow::Error>,
}

impl ViewerApp {
    fn new(
        cfg: Configuration,
        cancel: CancellationToken,
        image_path: PathBuf,
        image_size: Size,
    ) -> Self {
        Self {
            cfg,
            cancel,
            recovery: RecoveryLoop::new(image_path.clone()),
            image_path,
            image_size,
            window: None,
            gpu: None,
            engine: None,
            input: InputTracker::new(),
            timer: FrameTimer::new(SystemClock),
            fatal: None,
        }
    }

    fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Option<Arc<Window>> {
        if let Some(window) = self.window.as_ref() {
            return Some(window.clone());
        }

        let attrs = WindowAttributes::default().with_title("Pan Zoom");
        match event_loop.create_window(attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                if self.cfg.fullscreen {
                    let monitor = window.current_monitor();
                    window.set_fullscreen(Some(Fullscreen::Borderless(monitor)));
                    info!("window fullscreen initialized");
                }
                window.set_cursor_visible(!self.cfg.hide_cursor);
                self.window = Some(window.clone());
                Some(window)
            }
            Err(err) => {
                error!(error = %err, "failed to create viewer window");
                None
            }
        }
    }

    fn init(&mut self, window: Arc<Window>) -> Result<()> {
        let mut gpu = Gpu::new(window, &self.cfg)?;
        gpu.load_photo(&self.image_path)
            .with_context(|| format!("failed to load {}", self.image_path.display()))?;

        let engine = Engine::new(
            self.image_size,
            gpu.surface_size(),
            self.cfg.speed_presets.clone(),
        )?;
        info!(
            image_width = self.image_size.width,
            image_height = self.image_size.height,
            surface_width = engine.surface_size().width,
            surface_height = engine.surface_size().height,
            "viewer ready"
        );

        self.gpu = Some(gpu);
        self.engine = Some(engine);
        self.timer.restart();
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!(error = ?err, "viewer stopping");
        self.fatal = Some(err);
        event_loop.exit();
    }

    /// One tick: poll recovery, advance the engine, present.
    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let elapsed = self.timer.tick();
        let snapshot = self.input.snapshot(elapsed);
        if snapshot.exit {
            info!("exit requested");
            event_loop.exit();
            return;
        }

        let (Some(gpu), Some(engine)) = (self.gpu.as_mut(), self.engine.as_mut()) else {
            return;
        };

        match self.recovery.poll(gpu) {
            Ok(RecoveryStep::Render) => {}
            Ok(RecoveryStep::Waiting) => return,
            Err(err) => {
                self.fail(event_loop, err.into());
                return;
            }
        }

        let output = engine.tick(&snapshot);
        match gpu.draw(&output, self.cfg.pick_feedback_color.to_wgpu()) {
            Ok(PresentOutcome::Presented) | Ok(PresentOutcome::Skipped) => {}
            Ok(PresentOutcome::Lost) => self.recovery.present_failed(gpu),
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn handle_resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(new_size);
        }
        if let Some(engine) = self.engine.as_mut() {
            engine.set_surface_size(Size::from_pixels(new_size.width, new_size.height));
        }
    }
}

impl ApplicationHandler<ViewerEvent> for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.cancel.is_cancelled() {
            event_loop.exit();
            return;
        }

        let Some(window) = self.ensure_window(event_loop) else {
            self.fail(event_loop, anyhow!("no window available"));
            return;
        };

        if self.gpu.is_none() {
            if let Err(err) = self.init(window.clone()) {
                self.fail(event_loop, err);
                return;
            }
        }

        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if window.id() != window_id {
            return;
        }

        if self.input.handle_window_event(&event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("viewer window close requested");
                self.input.request_exit();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.handle_resize(new_size);
            }
            WindowEvent::ScaleFactorChanged {
                mut inner_size_writer,
                ..
            } => {
                let size = window.inner_size();
                let _ = inner_size_writer.request_inner_size(size);
                self.handle_resize(size);
            }
            WindowEvent::RedrawRequested => {
                self.frame(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.input.exit_requested() {
            event_loop.exit();
            return;
        }

        if self.recovery.state() == DisplaySurfaceState::Ready {
            event_loop.set_control_flow(ControlFlow::Poll);
            if let Some(window) = self.window.as_ref() {
                window.request_redraw();
            }
        } else {
            // Redraws may never arrive while the surface is gone; poll from here.
            debug!(state = ?self.recovery.state(), "polling surface recovery");
            self.frame(event_loop);
            event_loop.set_control_flow(ControlFlow::wait_duration(RECOVERY_POLL_INTERVAL));
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Cancelled => {
                info!("viewer received cancellation event");
                event_loop.exit();
            }
        }
    }
}

/// Opens the viewer window on `image_path` and runs until exit or cancellation.
///
/// # Errors
/// Returns an error if the window or GPU cannot be initialized, the image cannot
/// be uploaded, or the surface cannot be reset after a loss.
pub fn run_windowed(
    image_path: PathBuf,
    image_size: Size,
    cfg: Configuration,
    cancel: CancellationToken,
) -> Result<()> {
    let event_loop = EventLoop::<ViewerEvent>::with_user_event()
        .build()
        .context("failed to build viewer event loop")?;
    let proxy = event_loop.create_proxy();

    let cancel_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            cancel.cancelled().await;
            let _ = proxy.send_event(ViewerEvent::Cancelled);
        })
    };

    let mut app = ViewerApp::new(cfg, cancel, image_path, image_size);
    let run_result = event_loop.run_app(&mut app);
    cancel_task.abort();

    run_result.context("viewer event loop failed")?;
    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
