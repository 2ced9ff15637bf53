//! Concrete strategies. Each maps a closed-candle history to a direction.

pub mod color;
pub mod ema;
pub mod majority;
pub mod rsi;
pub mod zigzag;

pub use color::ColorPatternStrategy;
pub use ema::EmaTrendStrategy;
pub use majority::MajorityStrategy;
pub use rsi::RsiStrategy;
pub use zigzag::ZigZagStrategy;
