pub mod health;
pub mod login;
pub mod password_reset;
pub mod register;
pub mod validation;

pub use health::health_check;
pub use login::{login, me};
pub use password_reset::{request_own_password_reset, request_password_reset, reset_password};
pub use register::register;
