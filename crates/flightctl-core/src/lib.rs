//! Core types and utilities for the flightctl control plane.
//!
//! This crate provides the foundational vocabulary shared by the store and
//! the API server:
//!
//! - **Resource kinds**: the [`Kind`] enum and owner-reference helpers
//! - **Error taxonomy**: the [`StoreError`] type every layer above the
//!   relational engine speaks
//!
//! # Example
//!
//! ```
//! use flightctl_core::Kind;
//!
//! let owner = Kind::Fleet.owner_ref("my-fleet");
//! assert_eq!(owner, "Fleet/my-fleet");
//!
//! let (kind, name) = Kind::parse_owner_ref(&owner).unwrap();
//! assert_eq!(kind, Kind::Fleet);
//! assert_eq!(name, "my-fleet");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod kind;

pub use error::{Result, StoreError};
pub use kind::Kind;
