pub mod consul;
pub mod file_source;
