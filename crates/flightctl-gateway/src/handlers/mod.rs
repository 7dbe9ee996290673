//! REST handlers, one module per resource kind.

pub mod authproviders;
pub mod catalogs;
pub mod certificatesigningrequests;
pub mod common;
pub mod devices;
pub mod enrollmentrequests;
pub mod events;
pub mod fleets;
pub mod health;
pub mod organizations;
pub mod repositories;
pub mod resourcesyncs;
pub mod templateversions;
