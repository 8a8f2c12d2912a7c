#![forbid(unsafe_code)]
#![warn(
    clippy::cargo,
    clippy::suspicious,
    // missing_docs,
    clippy::nursery,
    rust_2018_idioms
)]

pub mod cuckoo;
pub mod heron;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod settings;
pub mod topology;

pub type Result<T> = anyhow::Result<T>;
