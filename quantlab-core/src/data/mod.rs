//! Price data sources: the consumed contract plus in-memory, CSV, caching
//! and synthetic implementations.

pub mod cache;
pub mod csv_source;
pub mod memory;
pub mod provider;
pub mod synthetic;

pub use cache::{CachePolicy, CachedSource};
pub use csv_source::CsvDirectorySource;
pub use memory::InMemorySource;
pub use provider::{DataError, PriceDataSource};
pub use synthetic::{random_walk, SyntheticSource};
