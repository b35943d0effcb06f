//! Functional core for the blitz-auth OAuth adapter.
//!
//! Everything in this crate is free of I/O: request classification, the
//! normalized request model, cookie and session bookkeeping, and the traits
//! the imperative shell (`blitz_auth`) plugs providers and callbacks into.

pub mod auth;
