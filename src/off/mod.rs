pub mod client;
pub mod mapping;
pub mod types;

pub use client::{FetchError, OffClient, DEFAULT_BASE_URL};
pub use mapping::{summarize, to_facts, ProductSummary};
pub use types::{OffProduct, OffResponse};
