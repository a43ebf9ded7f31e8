pub mod passwords;
pub mod tokens;

pub use passwords::*;
pub use tokens::*;
