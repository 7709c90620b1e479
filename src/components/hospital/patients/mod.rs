//! Patient screens: the searchable list and the shared add/edit form.

pub mod form;
pub mod list;
