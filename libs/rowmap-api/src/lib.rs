pub mod descriptor;

pub use rowmap_derive::MapTarget;
pub mod error;
pub mod row;
pub mod schema;
pub mod value;
