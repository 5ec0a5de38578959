//! Authentication building blocks: JWT access tokens, opaque refresh and
//! verification tokens, and Argon2id password hashing.

pub mod jwt;
pub mod password;
