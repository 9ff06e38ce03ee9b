//! HTTP fetcher for pagetally.
//!
//! [`FetchClient`] implements [`pagetally_core::Fetcher`], so it can sit
//! directly behind a [`pagetally_core::CachingInterceptor`].

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, FetchError, FetchResponse, UrlError, canonicalize};
