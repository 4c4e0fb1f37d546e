//! Schema descriptors and naming conventions.

mod catalog;
mod model;
mod naming;

pub use catalog::{declared_laundry_model, laundry_model};
pub use model::{ColumnType, EntityType, ForeignKey, Index, Key, Model, Property};
pub use naming::to_snake_case;
