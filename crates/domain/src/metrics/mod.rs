pub mod apr;

pub use apr::{compute_token_native_apr, compute_usd_apr};
