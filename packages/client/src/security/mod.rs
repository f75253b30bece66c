//! Connect authorization
//!
//! A socket asks its `ConnectPolicy` before any network activity toward a
//! destination. A denial surfaces as a `PermissionDenied` error.

pub mod policy;

pub use policy::{AllowAll, ConnectPolicy, DenyList};
