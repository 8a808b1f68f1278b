pub mod pool;
pub mod position;
pub mod swap;

// Re-export for easier access
pub use pool::Pool;
pub use position::{Position, PositionId};
pub use swap::{Swap, SwapSeries};
