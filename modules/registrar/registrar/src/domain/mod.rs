pub mod cache;
pub mod catalog;
pub mod error;
pub mod model;
pub mod pool;
pub mod service;
pub mod upstreams;

#[cfg(test)]
mod service_test;
#[cfg(test)]
mod test_support;
