//! Pure domain logic for the Roadpay verification gate and advance credit
//! engine.
//!
//! Nothing in this crate performs I/O: time comes in through [`clock::Clock`],
//! persistence lives in `roadpay-db`, and orchestration lives in
//! `roadpay-api`. Keeping the invariant checks pure makes them deterministic
//! and unit-testable.

pub mod advance;
pub mod clock;
pub mod error;
pub mod money;
pub mod otp;
pub mod types;
pub mod validation;
pub mod verification;
