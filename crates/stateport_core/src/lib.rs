pub mod config;
pub mod grammar;
pub mod imports;
pub mod matcher;
pub mod migrate;
pub mod rewrite;
pub mod store;
