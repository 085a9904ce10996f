pub mod logging;
pub mod ring;
pub mod stats;

pub use ring::RingBuffer;
