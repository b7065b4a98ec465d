// Order-book data model and depth arithmetic
pub mod types;
pub mod aggregate;

pub use aggregate::aggregate;
pub use types::*;
