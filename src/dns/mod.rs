pub mod hickory;
pub mod memory;
pub mod resolver;
pub mod source;
pub mod wildcard;

pub use hickory::HickorySource;
pub use memory::StaticDnsSource;
pub use resolver::{BatchResolution, Resolver, ResolverSettings};
pub use source::{DnsSource, RawAnswer, RawOutcome};
pub use wildcard::WildcardDetector;
