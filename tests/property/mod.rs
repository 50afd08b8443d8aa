//! Property-based tests

#[cfg(feature = "ssr")]
mod presence_proptest;
#[cfg(feature = "ssr")]
mod template_proptest;
mod locale_proptest;
