//! Command implementations.

mod run;
mod validate;

pub use run::run_fork;
pub use validate::run_validate;
