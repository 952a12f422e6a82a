//! Bounded fan-out of async operations
//!
//! Operations are issued in waves of at most `limit` calls. A wave is joined
//! as a whole before the next one is issued, so at most `limit` calls are in
//! flight and results keep call-index order.

pub mod wave;

pub use wave::{run_concurrent, WaveRunner};
