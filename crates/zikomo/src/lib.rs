//! A multilingual assistant that answers questions, reports the weather, and
//! books appointments.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library, [`Session::query`] is the entry point for web front
//! ends.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod query;
mod session;
pub mod settings;
pub mod slots;
pub mod tools;
pub mod translate;

pub use session::{Session, SessionBuilder};

/// Re-exports of [`zikomo_core`] crate.
pub mod core {
    pub use zikomo_core::*;
}
