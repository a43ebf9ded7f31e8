pub mod config;
pub mod container;
pub mod error;
pub mod host;
pub mod user;

pub use config::*;
pub use container::*;
pub use error::*;
pub use host::*;
pub use user::*;
