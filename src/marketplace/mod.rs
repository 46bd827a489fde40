pub mod client;
pub mod sellers;
pub mod types;
