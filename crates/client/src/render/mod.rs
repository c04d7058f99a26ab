// Canvas rendering - world background, avatar frames, name labels
use glam::Vec2;
use protocol::{AvatarDefinition, Facing, PlayerState};
use std::collections::HashMap;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::camera::Camera;

/// Side length of the bounding box an avatar frame is scaled into, on its
/// longer axis.
pub const AVATAR_SIZE: f32 = 32.0;

/// Cull margin around the canvas, per side. Wide enough that a half-visible
/// avatar at the edge still renders.
pub const CULL_MARGIN: f32 = 50.0;

/// Source of the one-time world background image.
const WORLD_IMAGE_SRC: &str = "world.jpg";

/// Scale a frame into the avatar bounding box, longer axis first, aspect
/// ratio preserved. Degenerate dimensions fall back to a full square so the
/// function stays total.
#[inline]
pub fn fit_frame(width: f32, height: f32) -> Vec2 {
    if width <= 0.0 || height <= 0.0 {
        return Vec2::splat(AVATAR_SIZE);
    }
    let aspect = width / height;
    if aspect >= 1.0 {
        Vec2::new(AVATAR_SIZE, AVATAR_SIZE / aspect)
    } else {
        Vec2::new(AVATAR_SIZE * aspect, AVATAR_SIZE)
    }
}

/// Visibility check against the canvas expanded by `CULL_MARGIN` on each
/// side. Positions exactly on the margin boundary count as visible.
#[inline]
pub fn on_screen(screen_pos: Vec2, canvas_size: Vec2) -> bool {
    screen_pos.x >= -CULL_MARGIN
        && screen_pos.x <= canvas_size.x + CULL_MARGIN
        && screen_pos.y >= -CULL_MARGIN
        && screen_pos.y <= canvas_size.y + CULL_MARGIN
}

/// True once a browser image has finished decoding and is safe to draw.
#[inline]
fn resident(img: &HtmlImageElement) -> bool {
    img.complete() && img.natural_width() > 0
}

pub struct Renderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    /// World background, loaded once at construction. Drawing is deferred
    /// until it is resident.
    world_image: HtmlImageElement,
    /// Decoded-image cache keyed by frame source identifier. Populated on
    /// first reference, reused for every subsequent draw — frames are never
    /// reloaded per draw call.
    frames: HashMap<String, HtmlImageElement>,
}

impl Renderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or("Failed to get 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()?;

        let world_image = HtmlImageElement::new()?;
        world_image.set_src(WORLD_IMAGE_SRC);

        Ok(Self {
            canvas,
            ctx,
            world_image,
            frames: HashMap::new(),
        })
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.canvas.width() as f32
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.canvas.height() as f32
    }

    #[inline]
    pub fn canvas_size(&self) -> Vec2 {
        Vec2::new(self.width(), self.height())
    }

    /// Resize the canvas to fill the window.
    pub fn resize_to_window(&self) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        self.canvas
            .set_width(window.inner_width()?.as_f64().unwrap_or(800.0) as u32);
        self.canvas
            .set_height(window.inner_height()?.as_f64().unwrap_or(600.0) as u32);
        Ok(())
    }

    pub fn world_ready(&self) -> bool {
        resident(&self.world_image)
    }

    /// World bounds, taken from the background image's natural dimensions.
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.world_image.natural_width() as f32,
            self.world_image.natural_height() as f32,
        )
    }

    #[inline]
    pub fn clear(&self, background: &str) {
        self.ctx.set_fill_style_str(background);
        self.ctx
            .fill_rect(0.0, 0.0, self.width() as f64, self.height() as f64);
    }

    /// Draw the world background shifted by the viewport origin. When the
    /// canvas exceeds the world, the beyond-world margin stays background.
    pub fn draw_world(&self, viewport: Vec2) {
        self.ctx
            .draw_image_with_html_image_element(
                &self.world_image,
                -viewport.x as f64,
                -viewport.y as f64,
            )
            .ok();
    }

    /// Start loading every stored frame of an avatar the first time the
    /// definition is seen. The browser fetches and decodes asynchronously;
    /// draw passes only use frames that are already resident.
    pub fn ensure_avatar(&mut self, avatar: &AvatarDefinition) {
        for sequence in avatar.frames.stored_sequences() {
            for src in sequence {
                if self.frames.contains_key(src) {
                    continue;
                }
                if let Ok(img) = HtmlImageElement::new() {
                    img.set_src(src);
                    self.frames.insert(src.clone(), img);
                }
            }
        }
    }

    /// True while any referenced frame image is still decoding. The game
    /// loop keeps the dirty flag armed until this clears.
    pub fn has_loading_frames(&self) -> bool {
        self.frames.values().any(|img| !resident(img))
    }

    /// Draw one player's avatar frame and name label.
    ///
    /// Silently skips when the player is culled, the frame sequence has no
    /// entry at the player's animation index, or the image is not resident
    /// yet — malformed or still-loading avatar data degrades rendering, it
    /// never crashes it.
    pub fn draw_avatar(&self, player: &PlayerState, avatar: &AvatarDefinition, camera: &Camera) {
        let screen = camera.world_to_screen(player.position());
        if !on_screen(screen, self.canvas_size()) {
            return;
        }

        // West always renders the east sequence, mirrored below.
        let sequence = avatar.frames.sequence(player.facing);
        let Some(src) = sequence.get(player.animation_frame) else {
            return;
        };
        let Some(img) = self.frames.get(src) else {
            return;
        };
        if !resident(img) {
            // Not decoded yet; this frame renders nothing rather than
            // queuing a stale async completion.
            return;
        }

        let size = fit_frame(img.natural_width() as f32, img.natural_height() as f32);
        let (w, h) = (size.x as f64, size.y as f64);
        let (sx, sy) = (screen.x as f64, screen.y as f64);

        if player.facing == Facing::West {
            // Mirror by flipping the coordinate system around the avatar's
            // vertical axis; the asset itself is never pre-flipped.
            self.ctx.save();
            let _ = self.ctx.translate(sx, sy);
            let _ = self.ctx.scale(-1.0, 1.0);
            self.ctx
                .draw_image_with_html_image_element_and_dw_and_dh(img, -w / 2.0, -h / 2.0, w, h)
                .ok();
            self.ctx.restore();
        } else {
            self.ctx
                .draw_image_with_html_image_element_and_dw_and_dh(
                    img,
                    sx - w / 2.0,
                    sy - h / 2.0,
                    w,
                    h,
                )
                .ok();
        }

        self.draw_label(&player.username, screen, size.y);
    }

    /// Name label centered above the avatar. Stroke before fill so the text
    /// stays legible over arbitrary background pixels.
    fn draw_label(&self, text: &str, screen: Vec2, frame_height: f32) {
        if text.is_empty() {
            return;
        }
        let x = screen.x as f64;
        let y = (screen.y - frame_height / 2.0 - 6.0) as f64;

        self.ctx.set_font("14px Arial");
        self.ctx.set_text_align("center");
        self.ctx.set_text_baseline("bottom");

        self.ctx.set_line_width(3.0);
        self.ctx.set_stroke_style_str("black");
        self.ctx.stroke_text(text, x, y).ok();
        self.ctx.set_fill_style_str("white");
        self.ctx.fill_text(text, x, y).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_frames_pin_width_to_the_box() {
        // aspect 2:1
        assert_eq!(fit_frame(64.0, 32.0), Vec2::new(32.0, 16.0));
    }

    #[test]
    fn tall_frames_pin_height_to_the_box() {
        // aspect 1:2
        assert_eq!(fit_frame(32.0, 64.0), Vec2::new(16.0, 32.0));
    }

    #[test]
    fn square_frames_fill_the_box_exactly() {
        assert_eq!(fit_frame(48.0, 48.0), Vec2::splat(32.0));
    }

    #[test]
    fn degenerate_dimensions_do_not_blow_up() {
        assert_eq!(fit_frame(0.0, 10.0), Vec2::splat(32.0));
        assert_eq!(fit_frame(10.0, 0.0), Vec2::splat(32.0));
    }

    #[test]
    fn culling_keeps_positions_exactly_on_the_margin() {
        let canvas = Vec2::new(800.0, 600.0);
        assert!(on_screen(Vec2::new(-50.0, 300.0), canvas));
        assert!(on_screen(Vec2::new(850.0, 300.0), canvas));
        assert!(on_screen(Vec2::new(400.0, -50.0), canvas));
        assert!(on_screen(Vec2::new(400.0, 650.0), canvas));
    }

    #[test]
    fn culling_drops_positions_past_the_margin() {
        let canvas = Vec2::new(800.0, 600.0);
        assert!(!on_screen(Vec2::new(-50.1, 300.0), canvas));
        assert!(!on_screen(Vec2::new(850.1, 300.0), canvas));
        assert!(!on_screen(Vec2::new(400.0, 650.1), canvas));
    }
}
