//! Domain engines: orchestration between the pure rules in `roadpay_core`
//! and the repositories in `roadpay_db`.
//!
//! Each engine owns the transaction boundaries for its operations. Handlers
//! stay thin: parse the request, call one engine function, shape the
//! response.

pub mod advance;
pub mod gate;
pub mod ledger;
pub mod otp;
pub mod subscription;
pub mod tokens;
