//! Session and page fetching against the source web application

mod client;
mod fetcher;

pub use client::{build_http_client, RawPage, Session};
pub use fetcher::{PageFetcher, PageSource};
