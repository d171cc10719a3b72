use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use image::RgbaImage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoopProxy};
use winit::window::WindowId;

use super::shape::{DesktopShape, WinitDesktop};
use crate::core::{CowConfig, CowRequest, CowState, DisplayCompletion, DisplaySink, TICK_INTERVAL_MS};
use crate::popup::PopupController;
use crate::render::BuiltinRenderer;

const TICK: Duration = Duration::from_millis(TICK_INTERVAL_MS);

/// Messages posted to the GUI thread's event loop.
#[derive(Debug)]
pub enum GuiEvent {
    Display {
        request: CowRequest,
        done: Arc<DisplayCompletion>,
    },
    Quit,
}

impl DisplaySink for EventLoopProxy<GuiEvent> {
    fn submit(&self, request: CowRequest) -> Result<Arc<DisplayCompletion>> {
        let done = DisplayCompletion::new();
        self.send_event(GuiEvent::Display {
            request,
            done: Arc::clone(&done),
        })
        .map_err(|_| anyhow!("GUI event loop has exited"))?;
        Ok(done)
    }
}

/// Owns the live popup and drives it from the event loop: ticks on a timer,
/// dismisses on click and repaints on request.
pub struct CowsayGui {
    config: CowConfig,
    controller: PopupController<BuiltinRenderer, DesktopShape>,
    /// Request shown as soon as the loop starts, for one-shot mode.
    initial: Option<CowRequest>,
    /// Exit once the first popup has been cleaned up.
    one_shot: bool,
    current_done: Option<Arc<DisplayCompletion>>,
    next_tick: Option<Instant>,
    error: Option<anyhow::Error>,
}

impl CowsayGui {
    pub fn one_shot(config: CowConfig, cow_image: RgbaImage, request: CowRequest) -> Self {
        let mut gui = Self::daemon(config, cow_image);
        gui.initial = Some(request);
        gui.one_shot = true;
        gui
    }

    pub fn daemon(config: CowConfig, cow_image: RgbaImage) -> Self {
        Self {
            config,
            controller: PopupController::new(cow_image, BuiltinRenderer::new(), StdRng::from_entropy()),
            initial: None,
            one_shot: false,
            current_done: None,
            next_tick: None,
            error: None,
        }
    }

    /// The error that ended a one-shot run, if any.
    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.error.take()
    }

    fn start(&mut self, event_loop: &ActiveEventLoop, request: CowRequest, done: Option<Arc<DisplayCompletion>>) {
        let mut desktop = WinitDesktop::new(event_loop);
        match self.controller.display(&mut desktop, request, &self.config) {
            Ok(()) => {
                self.current_done = done;
                self.next_tick = Some(Instant::now() + TICK);
            }
            Err(e) if self.one_shot => {
                self.error = Some(e);
                event_loop.exit();
            }
            Err(e) => {
                tracing::warn!("Skipping request: {:#}", e);
                if let Some(done) = done {
                    done.signal();
                }
            }
        }
    }

    fn on_state(&mut self, event_loop: &ActiveEventLoop, state: Option<CowState>) {
        if state == Some(CowState::Cleanup) {
            self.next_tick = None;
            if let Some(done) = self.current_done.take() {
                done.signal();
            }
            if self.one_shot {
                event_loop.exit();
            }
        }
    }

    fn release_waiter(&mut self) {
        if let Some(done) = self.current_done.take() {
            done.signal();
        }
    }
}

impl ApplicationHandler<GuiEvent> for CowsayGui {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(request) = self.initial.take() {
            self.start(event_loop, request, None);
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: GuiEvent) {
        match event {
            GuiEvent::Display { request, done } => self.start(event_loop, request, Some(done)),
            GuiEvent::Quit => {
                tracing::info!("Quit requested");
                self.release_waiter();
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let id = u64::from(window_id);
        match event {
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                ..
            } => {
                let state = self.controller.dismiss(id);
                self.on_state(event_loop, state);
            }
            WindowEvent::RedrawRequested => {
                if let Some(shape) = self.controller.shape_mut(id) {
                    if let Err(e) = shape.redraw() {
                        tracing::warn!("Failed to draw shape: {:#}", e);
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(when) = self.next_tick {
            let now = Instant::now();
            if now >= when {
                // One tick per wakeup, however late it is
                self.next_tick = Some(now + TICK);
                let state = self.controller.tick();
                self.on_state(event_loop, state);
            }
        }

        match self.next_tick {
            Some(when) => event_loop.set_control_flow(ControlFlow::WaitUntil(when)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.release_waiter();
    }
}
