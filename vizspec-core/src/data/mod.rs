pub mod dataset;
pub mod table;

pub use dataset::{DataProducer, Dataset};
pub use table::{DataTable, DeclaredType};
