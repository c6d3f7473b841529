//! Scene objects: two paddles and a ball, each a position offset.

use atari_engine::coords::Vec2;
use atari_engine::input::{InputState, Key};

use crate::config::{
    BALL_DIAMETER, PADDLE_BOUND, PADDLE_HEIGHT, PADDLE_INSET, PADDLE_SPEED, PADDLE_WIDTH,
    ResizePolicy,
};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Instance index in the paddle buffers.
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Motion {
    #[default]
    Idle,
    Up,
    Down,
}

impl Motion {
    fn from_keys(up: bool, down: bool) -> Self {
        match (up, down) {
            (true, false) => Motion::Up,
            (false, true) => Motion::Down,
            _ => Motion::Idle,
        }
    }

    fn sign(self) -> f32 {
        match self {
            Motion::Idle => 0.0,
            Motion::Up => 1.0,
            Motion::Down => -1.0,
        }
    }
}

/// Paddle movement requested this tick.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct PaddleInput {
    pub left: Motion,
    pub right: Motion,
}

impl PaddleInput {
    /// Left paddle: W / S. Right paddle: arrow up / arrow down.
    pub fn from_keys(keys: &InputState) -> Self {
        Self {
            left: Motion::from_keys(keys.key_down(Key::W), keys.key_down(Key::S)),
            right: Motion::from_keys(keys.key_down(Key::ArrowUp), keys.key_down(Key::ArrowDown)),
        }
    }

    fn for_side(&self, side: Side) -> Motion {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Scene {
    paddles: [Vec2; 2],
    ball: Vec2,
}

impl Scene {
    /// Paddles centred vertically at their inset, ball in the middle.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            paddles: [
                Vec2::new(PADDLE_INSET, height / 2.0),
                Vec2::new(width - PADDLE_INSET, height / 2.0),
            ],
            ball: Vec2::new(width / 2.0, height / 2.0),
        }
    }

    pub fn paddle(&self, side: Side) -> Vec2 {
        self.paddles[side.index()]
    }

    /// Per-instance paddle offsets, left then right.
    pub fn paddle_offsets(&self) -> [Vec2; 2] {
        self.paddles
    }

    pub fn paddle_sizes() -> [Vec2; 2] {
        [Vec2::new(PADDLE_WIDTH, PADDLE_HEIGHT); 2]
    }

    pub fn ball_offset(&self) -> Vec2 {
        self.ball
    }

    pub fn ball_size() -> Vec2 {
        Vec2::splat(BALL_DIAMETER)
    }

    /// Moves the paddles for one tick of `dt` seconds. Returns whether any
    /// offset changed.
    pub fn update(&mut self, input: &PaddleInput, dt: f32, height: f32) -> bool {
        let mut changed = false;
        for side in [Side::Left, Side::Right] {
            let paddle = &mut self.paddles[side.index()];
            let y = move_paddle(paddle.y, input.for_side(side), dt, height);
            if y != paddle.y {
                paddle.y = y;
                changed = true;
            }
        }
        changed
    }

    /// Applies `policy` after a resize. Returns whether any offset changed.
    pub fn on_resize(&mut self, width: f32, height: f32, policy: ResizePolicy) -> bool {
        match policy {
            ResizePolicy::LeaveAsIs => false,
            ResizePolicy::Clamp => {
                let before = *self;

                self.paddles[Side::Right.index()].x = width - PADDLE_INSET;
                if let Some((lo, hi)) = paddle_range(height) {
                    for paddle in &mut self.paddles {
                        paddle.y = paddle.y.clamp(lo, hi);
                    }
                }

                let r = BALL_DIAMETER / 2.0;
                if width >= BALL_DIAMETER {
                    self.ball.x = self.ball.x.clamp(r, width - r);
                }
                if height >= BALL_DIAMETER {
                    self.ball.y = self.ball.y.clamp(r, height - r);
                }

                *self != before
            }
        }
    }
}

/// Vertical range for paddle centers, or `None` when the window is too short
/// to fit one.
fn paddle_range(height: f32) -> Option<(f32, f32)> {
    let hi = height - PADDLE_BOUND;
    (hi >= PADDLE_BOUND).then_some((PADDLE_BOUND, hi))
}

/// Moves one paddle and clamps it to the range. A paddle left outside the
/// range by a resize may only move back toward it, so a key never pushes a
/// paddle the opposite way.
fn move_paddle(y: f32, motion: Motion, dt: f32, height: f32) -> f32 {
    if motion == Motion::Idle {
        return y;
    }
    let Some((lo, hi)) = paddle_range(height) else {
        return y;
    };
    (y + motion.sign() * PADDLE_SPEED * dt).clamp(lo.min(y), hi.max(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use atari_engine::input::{InputEvent, InputFrame, KeyState};

    const W: f32 = 800.0;
    const H: f32 = 600.0;

    fn up_left() -> PaddleInput {
        PaddleInput {
            left: Motion::Up,
            right: Motion::Idle,
        }
    }

    #[test]
    fn initial_layout() {
        let s = Scene::new(W, H);
        assert_eq!(s.paddle(Side::Left), Vec2::new(35.0, 300.0));
        assert_eq!(s.paddle(Side::Right), Vec2::new(765.0, 300.0));
        assert_eq!(s.ball_offset(), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn zero_input_leaves_offsets_unchanged() {
        let mut s = Scene::new(W, H);
        let before = s;
        assert!(!s.update(&PaddleInput::default(), 0.016, H));
        assert_eq!(s, before);
    }

    #[test]
    fn holding_up_moves_by_speed_times_dt() {
        let mut s = Scene::new(W, H);
        let dt = 0.1;
        assert!(s.update(&up_left(), dt, H));
        assert!((s.paddle(Side::Left).y - (300.0 + dt * PADDLE_SPEED)).abs() < 1e-4);
        assert_eq!(s.paddle(Side::Right).y, 300.0);
    }

    #[test]
    fn holding_up_clamps_at_upper_bound() {
        let mut s = Scene::new(W, H);
        s.update(&up_left(), 10.0, H);
        assert_eq!(s.paddle(Side::Left).y, H - PADDLE_BOUND);
        assert!(!s.update(&up_left(), 0.5, H));
    }

    #[test]
    fn paddles_stay_in_bounds_for_any_key_sequence() {
        let mut s = Scene::new(W, H);
        let motions = [Motion::Up, Motion::Down, Motion::Idle];
        // Deterministic pseudo-random walk with varied dt.
        let mut seed = 0x2545_f491_u32;
        for _ in 0..10_000 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let input = PaddleInput {
                left: motions[(seed % 3) as usize],
                right: motions[((seed >> 8) % 3) as usize],
            };
            let dt = (seed >> 16) as f32 / u16::MAX as f32 * 0.25;
            s.update(&input, dt, H);

            for side in [Side::Left, Side::Right] {
                let y = s.paddle(side).y;
                assert!(y >= PADDLE_BOUND && y <= H - PADDLE_BOUND, "y = {y}");
            }
        }
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut keys = InputState::default();
        let mut frame = InputFrame::default();
        for key in [Key::W, Key::S, Key::ArrowUp] {
            keys.apply_event(
                &mut frame,
                InputEvent::Key {
                    key,
                    state: KeyState::Pressed,
                    repeat: false,
                },
            );
        }
        let input = PaddleInput::from_keys(&keys);
        assert_eq!(input.left, Motion::Idle);
        assert_eq!(input.right, Motion::Up);
    }

    #[test]
    fn too_short_window_freezes_paddles() {
        let mut s = Scene::new(W, 100.0);
        assert!(!s.update(&up_left(), 1.0, 100.0));
    }

    #[test]
    fn resize_leave_as_is_keeps_offsets() {
        let mut s = Scene::new(W, H);
        s.update(&up_left(), 10.0, H);
        let before = s;
        assert!(!s.on_resize(400.0, 200.0, ResizePolicy::LeaveAsIs));
        assert_eq!(s, before);
    }

    #[test]
    fn key_never_moves_paddle_against_its_direction_after_shrink() {
        let mut s = Scene::new(W, H);
        s.update(&up_left(), 10.0, H);
        assert_eq!(s.paddle(Side::Left).y, H - PADDLE_BOUND);

        let short = 300.0;
        s.on_resize(W, short, ResizePolicy::LeaveAsIs);
        let above = s.paddle(Side::Left).y;
        assert!(above > short - PADDLE_BOUND);

        assert!(!s.update(&up_left(), 0.016, short));
        assert_eq!(s.paddle(Side::Left).y, above);

        let down = PaddleInput {
            left: Motion::Down,
            right: Motion::Idle,
        };
        assert!(s.update(&down, 0.016, short));
        let y = s.paddle(Side::Left).y;
        assert!(y < above);
        assert!((y - (above - 0.016 * PADDLE_SPEED)).abs() < 1e-3);

        // Coming back in lands on the range, not past it.
        s.update(&down, 10.0, short);
        assert_eq!(s.paddle(Side::Left).y, PADDLE_BOUND);
    }

    #[test]
    fn resize_clamp_pulls_objects_back_in() {
        let mut s = Scene::new(W, H);
        s.update(&up_left(), 10.0, H);
        assert!(s.on_resize(400.0, 300.0, ResizePolicy::Clamp));

        assert_eq!(s.paddle(Side::Left).y, 300.0 - PADDLE_BOUND);
        assert_eq!(s.paddle(Side::Right).x, 400.0 - PADDLE_INSET);
        let ball = s.ball_offset();
        assert!(ball.x <= 400.0 - BALL_DIAMETER / 2.0);
        assert!(ball.y <= 300.0 - BALL_DIAMETER / 2.0);
    }
}
