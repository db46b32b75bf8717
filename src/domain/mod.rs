pub mod color;
pub mod property;
