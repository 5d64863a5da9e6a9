pub mod access;
pub mod dedupe;
pub mod error;
pub mod fallback;
pub mod ingest;
pub mod origin;
pub mod patterns;
pub mod pipeline;
pub mod price;
pub mod relevance;

pub use access::{AccessChecker, AccessErrorKind, AccessReport};
pub use error::PipelineError;
pub use ingest::candidate_from_raw;
pub use pipeline::ValidationPipeline;
pub use price::parse_price;
