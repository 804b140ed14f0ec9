pub mod codegen;
pub mod config;
pub mod error;
pub mod instantiate;
pub mod mapper;
pub mod resolver;
pub mod selector;

pub use config::MapperConfig;
pub use error::MappingError;
pub use mapper::{MappedRows, ResultMapper};
