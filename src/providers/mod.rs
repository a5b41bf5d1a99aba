//! Ready-made key sources
//!
//! Each provider implements [`KeySource`](crate::KeySource) for a place key
//! material gets published to. Anything else can be plugged in by
//! implementing the trait or wrapping a closure in
//! [`FnKeySource`](crate::FnKeySource).
//!
//! ## Available Providers
//!
//! - [`object_store`]: index and private key documents served over HTTP(S)

pub mod object_store;
