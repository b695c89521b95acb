pub mod parser;
pub mod schema;
pub mod snapshot;
pub mod types;

pub use types::*;
pub use parser::{config_base_dir, default_config, parse_config, validate_conflicts};
pub use snapshot::ReferenceSnapshot;
