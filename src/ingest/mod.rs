pub mod http;
pub mod source;

pub use http::HttpSource;
pub use source::{Delivery, Ingest, ReadingSource};
