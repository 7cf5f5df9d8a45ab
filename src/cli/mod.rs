pub mod commands;
pub mod select;
