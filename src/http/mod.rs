pub mod classifier;
pub mod client;
pub mod memory;
pub mod prober;

pub use classifier::{HttpEvidenceClassifier, RULES};
pub use client::ReqwestProber;
pub use memory::StaticProber;
pub use prober::HttpProber;
