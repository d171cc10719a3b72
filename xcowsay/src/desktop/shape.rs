use std::num::NonZeroU32;
use std::rc::Rc;

use anyhow::{Context as _, Result};
use image::RgbaImage;
use softbuffer::{Context, Surface};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event_loop::{ActiveEventLoop, OwnedDisplayHandle};
use winit::window::{Window, WindowLevel};

use crate::core::{Monitor, Size};
use crate::platform::{Desktop, Shape, ShapeId};

/// Pack an RGBA image into softbuffer's 0RGB words, keeping the alpha in the
/// top byte with the colour premultiplied so compositors that honour it can
/// blend the transparent parts.
pub fn premultiplied_argb(image: &RgbaImage) -> Vec<u32> {
    image
        .pixels()
        .map(|p| {
            let a = p[3] as u32;
            let r = p[0] as u32 * a / 255;
            let g = p[1] as u32 * a / 255;
            let b = p[2] as u32 * a / 255;
            (a << 24) | (r << 16) | (g << 8) | b
        })
        .collect()
}

/// A borderless always-on-top window showing a fixed image.
pub struct DesktopShape {
    // Fields drop in declaration order: surface before its context, both
    // before the window.
    surface: Surface<OwnedDisplayHandle, Rc<Window>>,
    _context: Context<OwnedDisplayHandle>,
    window: Rc<Window>,
    pixels: Vec<u32>,
    size: Size,
}

impl DesktopShape {
    fn create(event_loop: &ActiveEventLoop, image: RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        let (nz_width, nz_height) = NonZeroU32::new(width)
            .zip(NonZeroU32::new(height))
            .context("Cannot create an empty shape")?;

        let attrs = Window::default_attributes()
            .with_title("xcowsay")
            .with_decorations(false)
            .with_transparent(true)
            .with_resizable(false)
            .with_visible(false)
            .with_window_level(WindowLevel::AlwaysOnTop)
            .with_inner_size(PhysicalSize::new(width, height));
        let window = Rc::new(
            event_loop
                .create_window(attrs)
                .context("Failed to create window")?,
        );

        let context = Context::new(event_loop.owned_display_handle())
            .map_err(|e| anyhow::anyhow!("Failed to create softbuffer context: {}", e))?;
        let mut surface = Surface::new(&context, Rc::clone(&window))
            .map_err(|e| anyhow::anyhow!("Failed to create softbuffer surface: {}", e))?;
        surface
            .resize(nz_width, nz_height)
            .map_err(|e| anyhow::anyhow!("Failed to size softbuffer surface: {}", e))?;

        Ok(Self {
            surface,
            _context: context,
            window,
            pixels: premultiplied_argb(&image),
            size: Size::new(width, height),
        })
    }

    /// Copy the image into the window.
    pub fn redraw(&mut self) -> Result<()> {
        let (Some(width), Some(height)) = (
            NonZeroU32::new(self.size.width),
            NonZeroU32::new(self.size.height),
        ) else {
            return Ok(());
        };
        self.surface
            .resize(width, height)
            .map_err(|e| anyhow::anyhow!("Failed to resize surface: {}", e))?;

        let mut buffer = self
            .surface
            .buffer_mut()
            .map_err(|e| anyhow::anyhow!("Failed to map surface: {}", e))?;
        if buffer.len() != self.pixels.len() {
            // Window not at its requested size yet; wait for the next redraw
            return Ok(());
        }
        buffer.copy_from_slice(&self.pixels);

        self.window.pre_present_notify();
        buffer
            .present()
            .map_err(|e| anyhow::anyhow!("Failed to present surface: {}", e))
    }
}

impl Shape for DesktopShape {
    fn id(&self) -> ShapeId {
        u64::from(self.window.id())
    }

    fn move_to(&mut self, x: i32, y: i32) {
        self.window.set_outer_position(PhysicalPosition::new(x, y));
    }

    fn show(&mut self) {
        self.window.set_visible(true);
        self.window.request_redraw();
    }

    fn hide(&mut self) {
        self.window.set_visible(false);
    }

    fn destroy(self) {
        tracing::debug!("Destroying shape {}", self.id());
        self.window.set_visible(false);
    }
}

/// Creates shapes as windows on the running event loop.
pub struct WinitDesktop<'a> {
    event_loop: &'a ActiveEventLoop,
}

impl<'a> WinitDesktop<'a> {
    pub fn new(event_loop: &'a ActiveEventLoop) -> Self {
        Self { event_loop }
    }
}

impl Desktop for WinitDesktop<'_> {
    type Shape = DesktopShape;

    fn monitors(&self) -> Vec<Monitor> {
        self.event_loop
            .available_monitors()
            .map(|m| {
                let pos = m.position();
                let size = m.size();
                Monitor::new(pos.x, pos.y, size.width, size.height)
            })
            .collect()
    }

    fn create_shape(&mut self, image: RgbaImage) -> Result<DesktopShape> {
        DesktopShape::create(self.event_loop, image)
    }
}
