//! Emotion classification service client library.
//!
//! Provides the AI-provider capability trait, an HTTP provider client,
//! and the [`classifier::Classifier`] pipeline that routes every failure
//! (timeout, transport error, malformed response) to the deterministic
//! local analyzer in `guardian-core`, tagging each result with the path
//! that produced it.

pub mod classifier;
pub mod http;
pub mod provider;
