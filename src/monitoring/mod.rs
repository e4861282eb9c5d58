pub mod client;

pub use client::MetricsClient;
