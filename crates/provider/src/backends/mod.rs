//! Backend implementations of [`RemoteClient`](crate::query::RemoteClient).

pub mod memory;
pub mod postgrest;
