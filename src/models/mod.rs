pub mod candidate;
pub mod probe;
pub mod provider;
pub mod record;
pub mod resolution;
pub mod verdict;

pub use candidate::*;
pub use probe::*;
pub use provider::*;
pub use record::*;
pub use resolution::*;
pub use verdict::*;
