use anyhow::{bail, Context, Result};
use image::RgbaImage;
use rand::rngs::StdRng;
use rand::Rng;

use crate::core::{
    choose_monitor, display_duration, place, CowConfig, CowRequest, CowState, Size, Timeline,
};
use crate::effect::ShapeEffect;
use crate::platform::{BubbleRenderer, Desktop, Shape, ShapeId};
use crate::render::BubbleStyle;

/// The live popup: a cow, its bubble and the timeline driving them.
#[derive(Debug)]
pub struct PopupSession<S: Shape> {
    request: CowRequest,
    cow: Option<S>,
    bubble: Option<S>,
    bubble_size: Size,
    timeline: Timeline,
}

impl<S: Shape> PopupSession<S> {
    pub fn state(&self) -> CowState {
        self.timeline.state()
    }

    pub fn request(&self) -> &CowRequest {
        &self.request
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn bubble_size(&self) -> Size {
        self.bubble_size
    }

    pub fn owns(&self, id: ShapeId) -> bool {
        self.cow.as_ref().is_some_and(|s| s.id() == id)
            || self.bubble.as_ref().is_some_and(|s| s.id() == id)
    }

    pub fn shape_mut(&mut self, id: ShapeId) -> Option<&mut S> {
        self.cow
            .as_mut()
            .filter(|s| s.id() == id)
            .or_else(|| self.bubble.as_mut().filter(|s| s.id() == id))
    }

    pub fn tick(&mut self) -> Option<CowState> {
        let state = self.timeline.tick()?;
        self.enter(state);
        Some(state)
    }

    pub fn dismiss(&mut self) -> Option<CowState> {
        let state = self.timeline.dismiss()?;
        tracing::debug!("Popup dismissed");
        self.enter(state);
        Some(state)
    }

    fn enter(&mut self, state: CowState) {
        match ShapeEffect::on_enter(state) {
            Some(ShapeEffect::ShowBubble) => {
                if let Some(bubble) = self.bubble.as_mut() {
                    bubble.show();
                }
            }
            Some(ShapeEffect::HideBubble) => {
                if let Some(bubble) = self.bubble.as_mut() {
                    bubble.hide();
                }
            }
            Some(ShapeEffect::DestroyShapes) => {
                if let Some(cow) = self.cow.take() {
                    cow.destroy();
                }
                if let Some(bubble) = self.bubble.take() {
                    bubble.destroy();
                }
            }
            None => {}
        }
    }
}

/// Shows one request at a time: renders the bubble, places both shapes and
/// advances the popup on every tick until it has been cleaned up.
pub struct PopupController<R, S: Shape, G = StdRng> {
    cow_image: RgbaImage,
    renderer: R,
    rng: G,
    session: Option<PopupSession<S>>,
}

impl<R: BubbleRenderer, S: Shape, G: Rng> PopupController<R, S, G> {
    pub fn new(cow_image: RgbaImage, renderer: R, rng: G) -> Self {
        Self {
            cow_image,
            renderer,
            rng,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&PopupSession<S>> {
        self.session.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.session.is_none()
    }

    pub fn shape_mut(&mut self, id: ShapeId) -> Option<&mut S> {
        self.session.as_mut()?.shape_mut(id)
    }

    /// Start a display cycle for `request`. The cow appears straight away;
    /// the bubble follows once the lead-in has run out.
    pub fn display<D>(&mut self, desktop: &mut D, request: CowRequest, config: &CowConfig) -> Result<()>
    where
        D: Desktop<Shape = S>,
    {
        if let Some(session) = &self.session {
            bail!(
                "Cannot display a new cow while one is in state {:?}",
                session.state()
            );
        }

        let style = BubbleStyle::from_config(config);
        let bubble_image = self
            .renderer
            .render(&request, &style)
            .context("Failed to render bubble")?;
        let bubble_size = Size::new(bubble_image.width(), bubble_image.height());

        let cow_image = if config.placement.left {
            image::imageops::flip_horizontal(&self.cow_image)
        } else {
            self.cow_image.clone()
        };
        let cow_size = Size::new(cow_image.width(), cow_image.height());

        let monitors = desktop.monitors();
        let monitor = choose_monitor(&monitors, config.placement.monitor, &mut self.rng)
            .context("No monitors available")?;
        let placement = place(monitor, cow_size, bubble_size, &config.placement, &mut self.rng);
        tracing::debug!(
            "Placing cow at {:?} and bubble at {:?} on {:?}",
            placement.cow,
            placement.bubble,
            monitor
        );

        let duration = display_duration(&request.content, request.mode, &config.timing);

        let mut cow = desktop
            .create_shape(cow_image)
            .context("Failed to create cow shape")?;
        cow.move_to(placement.cow.0, placement.cow.1);
        cow.show();

        let mut bubble = match desktop.create_shape(bubble_image) {
            Ok(bubble) => bubble,
            Err(e) => {
                cow.destroy();
                return Err(e.context("Failed to create bubble shape"));
            }
        };
        bubble.move_to(placement.bubble.0, placement.bubble.1);

        tracing::debug!("Display duration {:?}", duration);
        self.session = Some(PopupSession {
            request,
            cow: Some(cow),
            bubble: Some(bubble),
            bubble_size,
            timeline: Timeline::new(
                config.timing.lead_in_ms,
                duration,
                config.timing.lead_out_ms,
            ),
        });
        Ok(())
    }

    /// Advance the live popup by one tick. Returns the state it entered, if
    /// any; after `Cleanup` the controller is idle again.
    pub fn tick(&mut self) -> Option<CowState> {
        let state = self.session.as_mut()?.tick()?;
        if state.is_terminal() {
            self.session = None;
        }
        Some(state)
    }

    /// A click on shape `id`. Only shapes of the live popup count.
    pub fn dismiss(&mut self, id: ShapeId) -> Option<CowState> {
        let session = self.session.as_mut()?;
        if !session.owns(id) {
            return None;
        }
        session.dismiss()
    }
}
