//! CLI command implementations.

mod config;
mod doctor;
mod extract;
mod init;
mod list;

pub use config::run_config;
pub use doctor::run_doctor;
pub use extract::run_extract;
pub use init::run_init;
pub use list::run_list;
