//! HTTP transport shared by the storage API adapter

mod client;

pub use client::{HttpClient, HttpClientBuilder};
