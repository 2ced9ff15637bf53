pub mod ema;
pub mod rsi;

pub use ema::{EmaIndicator, EmaTrend};
pub use rsi::RsiIndicator;
