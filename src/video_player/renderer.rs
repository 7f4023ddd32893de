// SPDX-License-Identifier: MPL-2.0
//! Frame renderer and its fixed-size render surface.
//!
//! The renderer is driven by display refresh ticks. It stays armed while the
//! element plays and disarms itself on the first tick that finds the element
//! paused, without drawing. Every draw goes through [`is_presentable`].

use super::decoder::DecodedFrame;
use super::element::{MediaElement, ReadyState};
use iced::widget::image;
use image_rs::{imageops, ImageBuffer, Rgba};

pub const SURFACE_WIDTH: u32 = 960;
pub const SURFACE_HEIGHT: u32 = 540;

const OPAQUE_BLACK: [u8; 4] = [0, 0, 0, 255];

/// Fixed-size RGBA target shown by the preview.
#[derive(Debug, Clone)]
pub struct RenderSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    /// Bumped on every write.
    generation: u64,
    handle: image::Handle,
}

impl Default for RenderSurface {
    fn default() -> Self {
        Self::new(SURFACE_WIDTH, SURFACE_HEIGHT)
    }
}

impl RenderSurface {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let pixels = OPAQUE_BLACK.repeat(width as usize * height as usize);
        let handle = image::Handle::from_rgba(width, height, pixels.clone());
        Self {
            width,
            height,
            pixels,
            generation: 0,
            handle,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Image handle of the latest content.
    #[must_use]
    pub fn handle(&self) -> &image::Handle {
        &self.handle
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Fills the surface with opaque black.
    pub fn clear(&mut self) {
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&OPAQUE_BLACK);
        }
        self.commit();
    }

    /// Writes `frame` stretched to the surface size.
    ///
    /// Returns `false` and leaves the surface untouched if the frame buffer
    /// does not match its declared size.
    pub fn draw(&mut self, frame: &DecodedFrame) -> bool {
        let expected_len = frame.width as usize * frame.height as usize * 4;
        if frame.width == 0 || frame.height == 0 || frame.rgba_data.len() != expected_len {
            tracing::warn!(
                width = frame.width,
                height = frame.height,
                len = frame.rgba_data.len(),
                "frame buffer size mismatch"
            );
            return false;
        }

        if frame.width == self.width && frame.height == self.height {
            self.pixels.copy_from_slice(&frame.rgba_data);
        } else {
            let Some(source) = ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(
                frame.width,
                frame.height,
                frame.rgba_data.as_slice(),
            ) else {
                return false;
            };
            let scaled = imageops::resize(
                &source,
                self.width,
                self.height,
                imageops::FilterType::Triangle,
            );
            self.pixels.copy_from_slice(scaled.as_raw());
        }

        self.commit();
        true
    }

    fn commit(&mut self) {
        self.generation += 1;
        self.handle = image::Handle::from_rgba(self.width, self.height, self.pixels.clone());
    }
}

/// What a refresh tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was copied to the surface.
    Drawn,
    /// Still playing but no presentable frame yet.
    Skipped,
    /// The element is paused; the loop is now disarmed.
    Stopped,
}

/// True when the element can present its current frame.
#[must_use]
pub fn is_presentable<E: MediaElement + ?Sized>(element: &E) -> bool {
    element.ready_state() >= ReadyState::HaveCurrentData && element.current_frame().is_some()
}

/// Display-refresh driven draw loop.
#[derive(Debug, Default)]
pub struct FrameRenderer {
    armed: bool,
    frames_drawn: u64,
}

impl FrameRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the next display refresh should produce a tick.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    #[must_use]
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Draws a poster frame when the element can play but is not playing.
    pub fn on_can_play<E: MediaElement + ?Sized>(
        &mut self,
        element: &E,
        surface: &mut RenderSurface,
    ) -> bool {
        if !element.is_paused() {
            return false;
        }
        self.draw(element, surface)
    }

    /// Arms the loop. Ticks before the first presentable frame are skipped.
    pub fn on_play(&mut self) {
        if !self.armed {
            tracing::trace!("render loop armed");
        }
        self.armed = true;
    }

    /// One display refresh.
    pub fn tick<E: MediaElement + ?Sized>(
        &mut self,
        element: &E,
        surface: &mut RenderSurface,
    ) -> TickOutcome {
        if !self.armed || element.is_paused() {
            if self.armed {
                tracing::trace!(frames = self.frames_drawn, "render loop stopped");
            }
            self.armed = false;
            return TickOutcome::Stopped;
        }

        if self.draw(element, surface) {
            TickOutcome::Drawn
        } else {
            TickOutcome::Skipped
        }
    }

    /// Disarms without touching the surface, used when the resource changes.
    pub fn reset(&mut self) {
        self.armed = false;
        self.frames_drawn = 0;
    }

    fn draw<E: MediaElement + ?Sized>(&mut self, element: &E, surface: &mut RenderSurface) -> bool {
        if !is_presentable(element) {
            return false;
        }
        let Some(frame) = element.current_frame() else {
            return false;
        };
        let drawn = surface.draw(frame);
        if drawn {
            self.frames_drawn += 1;
        }
        drawn
    }
}
