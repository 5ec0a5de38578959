//! HTTP request handlers. Thin: parse and validate the request, call an
//! engine or repository, shape the response envelope.

pub mod admin;
pub mod advances;
pub mod auth;
pub mod kyc;
pub mod subscriptions;
pub mod verification;
pub mod wallet;
