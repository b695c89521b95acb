//! Subdomain discovery sources.

pub mod source;
pub mod static_list;
pub mod subfinder;

pub use source::SubdomainSource;
pub use static_list::StaticSource;
pub use subfinder::SubfinderSource;
