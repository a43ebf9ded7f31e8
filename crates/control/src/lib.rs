pub mod hosts;
pub mod migrations;
pub mod users;

pub use hosts::HostRegistry;
pub use migrations::run_migrations;
pub use users::UserStore;
