#![forbid(unsafe_code)]

pub mod achievement;
pub mod codec;
pub mod model;
pub mod stats;
pub mod time;

pub use achievement::Achievement;
pub use codec::ProgressCodecError;
pub use time::Clock;
