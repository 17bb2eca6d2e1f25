pub mod config;
pub mod rest;
pub mod transport;

#[cfg(test)]
mod fake;
