mod auth;
mod client;
mod news_url;

pub mod domain;

pub(crate) use news_url::*;

pub use auth::*;
pub use client::*;
