mod factory;
mod user;

pub use factory::*;
pub use user::*;
