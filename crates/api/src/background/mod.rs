//! Background tasks spawned by the binary entrypoint.

pub mod weekly;
