//! Data models exchanged with the dashboard and the upstream HR API.
//!
//! Field names are camelCase on the wire to match the dashboard's contract.

mod employee;
mod option;
mod payroll;
mod scope;

pub use employee::*;
pub use option::*;
pub use payroll::*;
pub use scope::*;
