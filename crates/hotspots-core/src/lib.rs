//! Domain types, services and storage traits for the HotSpots study-spot
//! review service.
//!
//! Nothing here knows about HTTP or SQL. Storage backends implement
//! [`store::SpotStore`] and [`store::BlobStore`]; the API crate drives
//! [`catalog::Catalog`].

pub mod access;
pub mod aggregate;
pub mod catalog;
pub mod clock;
pub mod error;
pub mod factor;
pub mod identity;
pub mod review;
pub mod spot;
pub mod store;

pub use error::{Error, Result};
