pub mod memory;
pub mod store;
pub mod user;

pub use memory::InMemoryUserStore;
pub use store::{StoreError, UserStore};
pub use user::PgUserStore;
