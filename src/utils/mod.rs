pub mod formatting;
pub mod hostname;
pub mod patterns;
pub mod pool;
pub mod truncation;

pub use formatting::{format_chain, format_duration, format_ratio};
pub use hostname::normalize_hostname;
pub use patterns::PatternSet;
pub use pool::WorkerPool;
