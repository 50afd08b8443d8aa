//! Integration tests
//!
//! End-to-end flows through the assembled application state

#[cfg(feature = "ssr")]
mod dispatch_test;
#[cfg(feature = "ssr")]
mod presence_test;
#[cfg(feature = "ssr")]
mod rest_test;
mod client_test;
