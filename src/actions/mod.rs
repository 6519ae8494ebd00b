//! Built-in operation handlers, one module per operation type.

pub mod amend;
pub mod create;
pub mod create_all;
pub mod custom;
pub mod for_many;
pub mod modify;
