use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// One of the four color channels an effect is applied to independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Red.
    R,
    /// Green.
    G,
    /// Blue.
    B,
    /// Alpha.
    A,
}

impl Channel {
    /// Fixed emission order used by the decomposer.
    pub const ALL: [Channel; 4] = [Channel::R, Channel::G, Channel::B, Channel::A];

    /// Component index inside an RGBA pixel.
    pub fn index(self) -> usize {
        match self {
            Channel::R => 0,
            Channel::G => 1,
            Channel::B => 2,
            Channel::A => 3,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Channel::R => "R",
            Channel::G => "G",
            Channel::B => "B",
            Channel::A => "A",
        };
        f.write_str(s)
    }
}

/// The fixed effect set. Effects on the same image are independent, never chained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Effect {
    /// 3x3 box blur.
    Blur,
    /// 3x3 Laplacian-style edge detection.
    Edge,
    /// 3x3 sharpen.
    Sharpen,
    /// Per-pixel RGB average.
    Grayscale,
}

impl Effect {
    /// Parse a manifest effect code (`B`, `E`, `S`, `G`). Codes are case-sensitive.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "B" => Some(Effect::Blur),
            "E" => Some(Effect::Edge),
            "S" => Some(Effect::Sharpen),
            "G" => Some(Effect::Grayscale),
            _ => None,
        }
    }

    /// The manifest code for this effect.
    pub fn code(self) -> char {
        match self {
            Effect::Blur => 'B',
            Effect::Edge => 'E',
            Effect::Sharpen => 'S',
            Effect::Grayscale => 'G',
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Effect::Blur => "blur",
            Effect::Edge => "edge",
            Effect::Sharpen => "sharpen",
            Effect::Grayscale => "grayscale",
        };
        f.write_str(s)
    }
}

/// Cooperative cancellation flag shared between the caller and the pool.
///
/// Once cancelled, workers keep draining the queue (so every counter still reaches zero) but skip
/// kernel work, flatten and write.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token in the "running" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Return `true` once [`CancelToken::cancel`] has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
