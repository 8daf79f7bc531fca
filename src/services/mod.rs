pub mod auth;
pub mod clock;
pub mod email;
pub mod jwt;
pub mod password;
pub mod password_reset;
pub mod reset_token;

pub use auth::{AccessToken, AuthService, AuthSettings, NewUserInput, UnknownEmailPolicy};
pub use clock::{Clock, SystemClock};
pub use email::{EmailSender, EmailTemplate, LogEmailSender};
pub use jwt::{SessionClaims, TokenIssuer};
pub use password::CredentialHasher;
