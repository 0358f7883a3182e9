//! Domain values exchanged between the controller and the record backend.

pub mod page;
pub mod query;
pub mod record;
pub mod types;
