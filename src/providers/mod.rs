pub mod catalog;
pub mod identifier;
pub mod ranges;

pub use catalog::{ProviderCatalog, ProviderReference};
pub use identifier::ProviderIdentifier;
