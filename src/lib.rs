//! Domain crate for userhub.
//!
//! This crate owns the user model and the in-memory [`UserStore`]. The HTTP
//! surface (`crates/server`) depends on it and performs no business logic of
//! its own: every invariant (id allocation, email uniqueness, partial-update
//! rules, error precedence) lives here.
//!
//! ```
//! use userhub::{NewUser, UserPatch, UserStore};
//!
//! let store = UserStore::new();
//! let ada = store.create(NewUser::new("Ada", "ada@example.com")).unwrap();
//! assert_eq!(ada.id, 1);
//!
//! let renamed = store.update("1", UserPatch::name("Ada L.")).unwrap();
//! assert_eq!(renamed.email, "ada@example.com");
//! ```

mod error;
mod store;
mod user;

pub use error::StoreError;
pub use store::UserStore;
pub use user::{NewUser, User, UserId, UserPatch, parse_user_id};
