pub mod builder;
pub mod shutdown;
