//! Staff directory screens.

pub mod form;
pub mod list;
