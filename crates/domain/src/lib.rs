#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod error;
mod name;
mod progress;
mod quantity;
mod service;
mod session;
mod set;
mod user;
mod workout;

pub use error::*;
pub use name::*;
pub use progress::*;
pub use quantity::*;
pub use service::*;
pub use session::*;
pub use set::*;
pub use user::*;
pub use workout::*;
