// Camera system - world-clamped scrolling viewport centered on the local player
use glam::Vec2;

/// Clamped top-left viewport origin for a canvas centered on `player_pos`.
///
/// Center the canvas on the player, then clamp each axis independently into
/// `[0, max(0, world - canvas)]`. When the canvas is larger than the world
/// the origin pins to 0 and the surface shows beyond-world margin. Pure and
/// total over all inputs.
#[inline]
pub fn compute_viewport(player_pos: Vec2, canvas_size: Vec2, world_size: Vec2) -> Vec2 {
    let centered = player_pos - canvas_size / 2.0;
    centered.clamp(Vec2::ZERO, (world_size - canvas_size).max(Vec2::ZERO))
}

/// Holds the current viewport origin. Derived state only: the origin is
/// recomputed from the local player before every render pass and on resize,
/// never mutated independently.
pub struct Camera {
    pub viewport: Vec2,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            viewport: Vec2::ZERO,
        }
    }

    pub fn recompute(&mut self, player_pos: Vec2, canvas_size: Vec2, world_size: Vec2) {
        self.viewport = compute_viewport(player_pos, canvas_size, world_size);
    }

    /// Convert world coordinates to screen coordinates.
    #[inline]
    pub fn world_to_screen(&self, world_pos: Vec2) -> Vec2 {
        world_pos - self.viewport
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANVAS: Vec2 = Vec2::new(800.0, 600.0);
    const WORLD: Vec2 = Vec2::new(2048.0, 2048.0);

    #[test]
    fn centers_player_when_unclamped() {
        let v = compute_viewport(Vec2::new(1000.0, 1000.0), CANVAS, WORLD);
        assert_eq!(v, Vec2::new(600.0, 700.0));
        // Player lands exactly on the canvas center.
        assert_eq!(Vec2::new(1000.0, 1000.0) - v, CANVAS / 2.0);
    }

    #[test]
    fn clamps_to_world_edges() {
        assert_eq!(compute_viewport(Vec2::new(10.0, 5.0), CANVAS, WORLD), Vec2::ZERO);
        assert_eq!(
            compute_viewport(Vec2::new(2040.0, 2047.0), CANVAS, WORLD),
            Vec2::new(2048.0 - 800.0, 2048.0 - 600.0)
        );
    }

    #[test]
    fn origin_stays_within_bounds_for_any_position() {
        for &(x, y) in &[
            (-500.0, -500.0),
            (0.0, 0.0),
            (400.0, 300.0),
            (1024.0, 1024.0),
            (2048.0, 2048.0),
            (9999.0, 9999.0),
        ] {
            let v = compute_viewport(Vec2::new(x, y), CANVAS, WORLD);
            assert!(v.x >= 0.0 && v.x <= WORLD.x - CANVAS.x, "vx out of range: {v:?}");
            assert!(v.y >= 0.0 && v.y <= WORLD.y - CANVAS.y, "vy out of range: {v:?}");
        }
    }

    #[test]
    fn is_idempotent_for_identical_inputs() {
        let a = compute_viewport(Vec2::new(777.0, 333.0), CANVAS, WORLD);
        let b = compute_viewport(Vec2::new(777.0, 333.0), CANVAS, WORLD);
        assert_eq!(a, b);
    }

    #[test]
    fn canvas_larger_than_world_pins_origin_to_zero() {
        let v = compute_viewport(
            Vec2::new(100.0, 100.0),
            Vec2::new(3000.0, 2000.0),
            Vec2::new(1024.0, 1024.0),
        );
        assert_eq!(v, Vec2::ZERO);
    }

    #[test]
    fn camera_world_to_screen_subtracts_origin() {
        let mut camera = Camera::new();
        camera.recompute(Vec2::new(1000.0, 1000.0), CANVAS, WORLD);
        assert_eq!(
            camera.world_to_screen(Vec2::new(1000.0, 1000.0)),
            Vec2::new(400.0, 300.0)
        );
    }
}
