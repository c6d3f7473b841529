use std::fmt;

/// Keyboard key identifier.
///
/// Only the keys a keyboard-driven game cares about get named variants; the
/// platform layer maps everything else to `Key::Unknown` with its raw code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Space,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    /// Platform-dependent key not represented here.
    Unknown(u32),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Platform-agnostic events delivered to the frame loop.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key {
        key: Key,
        state: KeyState,
        /// True when the event is an OS key-repeat.
        repeat: bool,
    },

    /// Framebuffer size changed, in physical pixels.
    ///
    /// Delivered through the frame's event stream so the app reacts to it in
    /// its own update step.
    Resized { width: u32, height: u32 },

    /// Window focus change.
    Focused(bool),
}
