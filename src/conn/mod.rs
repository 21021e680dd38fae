//! SOCKS request and reply headers.

pub mod reply;
pub mod request;
