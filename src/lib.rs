//! A pop-launcher plugin for gopass.
//!
//! The [`engine`] speaks the launcher's line-delimited JSON protocol and is
//! independent of gopass; [`search`] and [`activate`] hold the pluggable
//! collaborators and their gopass implementations.

pub mod activate;
pub mod config;
pub mod consts;
pub mod engine;
pub mod logging;
pub mod protocol;
pub mod search;
