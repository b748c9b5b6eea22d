pub mod completions;
pub mod config;
pub mod cook;
pub mod lang;
pub mod recipes;
