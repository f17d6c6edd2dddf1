//! In-memory user store.
//!
//! The store owns the ordered user collection and the id counter. Both sit
//! behind a single mutex and every operation, reads included, holds it for
//! its whole duration, so each call is atomic and mutations are totally
//! ordered. Nothing under the lock performs I/O; trace events are emitted
//! after the guard is dropped.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;
use crate::user::{NewUser, User, UserId, UserPatch, parse_user_id};

#[derive(Debug)]
struct Inner {
    users: Vec<User>,
    next_id: UserId,
}

impl Inner {
    fn position(&self, id: UserId) -> Option<usize> {
        self.users.iter().position(|u| u.id == id)
    }

    fn email_owner(&self, email: &str) -> Option<UserId> {
        self.users.iter().find(|u| u.email == email).map(|u| u.id)
    }
}

/// Process-wide, volatile user collection.
#[derive(Debug)]
pub struct UserStore {
    inner: Mutex<Inner>,
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore {
    /// Empty store; the first created user gets id 1.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                users: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Store pre-populated with the three demo users (ids 1 to 3).
    pub fn with_demo_users() -> Self {
        let users = vec![
            User {
                id: 1,
                name: "John Doe".to_string(),
                email: "john@example.com".to_string(),
            },
            User {
                id: 2,
                name: "Jane Smith".to_string(),
                email: "jane@example.com".to_string(),
            },
            User {
                id: 3,
                name: "Mike Wilson".to_string(),
                email: "mike@example.com".to_string(),
            },
        ];
        Self {
            inner: Mutex::new(Inner { users, next_id: 4 }),
        }
    }

    // A panic while holding the guard cannot leave `Inner` half-written:
    // every mutation below completes its writes before anything can panic.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of all live users in insertion order.
    pub fn list_all(&self) -> Vec<User> {
        self.lock().users.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Users whose name contains `query`, ignoring case.
    ///
    /// An absent or empty query is an [`StoreError::InvalidArgument`]; no
    /// match is an empty vector.
    pub fn search(&self, query: Option<&str>) -> Result<Vec<User>, StoreError> {
        let needle = match query {
            Some(q) if !q.is_empty() => q.to_lowercase(),
            _ => {
                return Err(StoreError::invalid_argument(
                    "Query parameter \"name\" is required",
                ));
            }
        };

        let inner = self.lock();
        Ok(inner
            .users
            .iter()
            .filter(|u| u.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    /// Look up a user by the raw id string from the request path.
    pub fn get(&self, raw_id: &str) -> Result<User, StoreError> {
        let id = parse_user_id(raw_id)?;
        let inner = self.lock();
        inner
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| StoreError::user_not_found(id))
    }

    pub fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let NewUser { name, email } = new_user;
        if name.is_empty() || email.is_empty() {
            return Err(StoreError::invalid_argument("Name and email are required"));
        }

        let user = {
            let mut inner = self.lock();
            if inner.email_owner(&email).is_some() {
                return Err(StoreError::email_taken());
            }
            let id = inner.next_id;
            inner.next_id += 1;
            let user = User { id, name, email };
            inner.users.push(user.clone());
            user
        };

        tracing::debug!(user_id = user.id, "user created");
        Ok(user)
    }

    /// Overwrite the supplied fields of an existing user.
    ///
    /// Checks run in a fixed order: id format, existence, non-empty patch,
    /// email uniqueness against other live users.
    pub fn update(&self, raw_id: &str, patch: UserPatch) -> Result<User, StoreError> {
        let id = parse_user_id(raw_id)?;

        let user = {
            let mut inner = self.lock();
            let idx = inner
                .position(id)
                .ok_or_else(|| StoreError::user_not_found(id))?;

            if patch.is_empty() {
                return Err(StoreError::invalid_argument(
                    "At least one of name or email is required",
                ));
            }

            if let Some(email) = patch.supplied_email() {
                if matches!(inner.email_owner(email), Some(owner) if owner != id) {
                    return Err(StoreError::email_taken());
                }
            }

            let name = patch.supplied_name().map(str::to_owned);
            let email = patch.supplied_email().map(str::to_owned);
            let user = &mut inner.users[idx];
            if let Some(name) = name {
                user.name = name;
            }
            if let Some(email) = email {
                user.email = email;
            }
            user.clone()
        };

        tracing::debug!(user_id = user.id, "user updated");
        Ok(user)
    }

    /// Remove a user and return the removed record. Its id is never reissued.
    pub fn delete(&self, raw_id: &str) -> Result<User, StoreError> {
        let id = parse_user_id(raw_id)?;

        let user = {
            let mut inner = self.lock();
            let idx = inner
                .position(id)
                .ok_or_else(|| StoreError::user_not_found(id))?;
            inner.users.remove(idx)
        };

        tracing::debug!(user_id = user.id, "user deleted");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(names: &[(&str, &str)]) -> UserStore {
        let store = UserStore::new();
        for (name, email) in names {
            store.create(NewUser::new(*name, *email)).unwrap();
        }
        store
    }

    #[test]
    fn create_assigns_increasing_ids_in_insertion_order() {
        let store = store_with(&[("A", "a@x.io"), ("B", "b@x.io")]);
        let all = store.list_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, 1);
        assert_eq!(all[1].id, 2);
        assert_eq!(all[1].name, "B");
    }

    #[test]
    fn create_requires_name_and_email() {
        let store = UserStore::new();
        let err = store.create(NewUser::new("", "a@x.io")).unwrap_err();
        assert_eq!(
            err,
            StoreError::InvalidArgument("Name and email are required".into())
        );
        assert!(store.create(NewUser::new("A", "")).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn create_rejects_duplicate_email() {
        let store = store_with(&[("A", "a@x.io")]);
        let err = store.create(NewUser::new("Other", "a@x.io")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn email_match_is_case_sensitive() {
        let store = store_with(&[("A", "a@x.io")]);
        assert!(store.create(NewUser::new("B", "A@x.io")).is_ok());
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let store = store_with(&[("A", "a@x.io"), ("B", "b@x.io")]);
        store.delete("2").unwrap();
        let c = store.create(NewUser::new("C", "c@x.io")).unwrap();
        assert_eq!(c.id, 3);
    }

    #[test]
    fn deleted_email_becomes_available_again() {
        let store = store_with(&[("A", "a@x.io")]);
        store.delete("1").unwrap();
        let again = store.create(NewUser::new("A2", "a@x.io")).unwrap();
        assert_eq!(again.id, 2);
    }

    #[test]
    fn get_validates_id_before_lookup() {
        let store = UserStore::new();
        assert!(matches!(
            store.get("abc"),
            Err(StoreError::InvalidArgument(_))
        ));
        assert_eq!(
            store.get("999"),
            Err(StoreError::NotFound("User with id 999 not found".into()))
        );
    }

    #[test]
    fn get_is_idempotent() {
        let store = UserStore::with_demo_users();
        assert_eq!(store.get("2").unwrap(), store.get("2").unwrap());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let store = UserStore::with_demo_users();
        let hits = store.search(Some("jOhN")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "John Doe");

        let hits = store.search(Some("i")).unwrap();
        let ids: Vec<_> = hits.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn search_without_match_is_empty_not_error() {
        let store = UserStore::with_demo_users();
        assert!(store.search(Some("zzznotaname")).unwrap().is_empty());
    }

    #[test]
    fn search_requires_query() {
        let store = UserStore::with_demo_users();
        assert!(matches!(
            store.search(None),
            Err(StoreError::InvalidArgument(_))
        ));
        assert!(store.search(Some("")).is_err());
    }

    #[test]
    fn update_changes_only_supplied_fields() {
        let store = UserStore::with_demo_users();
        let before = store.get("1").unwrap();
        let after = store.update("1", UserPatch::name("X")).unwrap();
        assert_eq!(after.name, "X");
        assert_eq!(after.email, before.email);
        assert_eq!(store.get("1").unwrap(), after);
    }

    #[test]
    fn update_error_precedence() {
        let store = UserStore::with_demo_users();
        // malformed id wins over everything else
        assert!(matches!(
            store.update("x", UserPatch::default()),
            Err(StoreError::InvalidArgument(_))
        ));
        // missing user wins over an empty patch
        assert!(matches!(
            store.update("999", UserPatch::default()),
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(
            store.update("1", UserPatch::default()),
            Err(StoreError::InvalidArgument(
                "At least one of name or email is required".into()
            ))
        );
    }

    #[test]
    fn update_rejects_email_of_another_user() {
        let store = UserStore::with_demo_users();
        let err = store
            .update("1", UserPatch::email("jane@example.com"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.get("1").unwrap().email, "john@example.com");
    }

    #[test]
    fn update_accepts_own_email() {
        let store = UserStore::with_demo_users();
        let user = store
            .update("1", UserPatch::email("john@example.com"))
            .unwrap();
        assert_eq!(user.email, "john@example.com");
    }

    #[test]
    fn delete_returns_removed_record() {
        let store = UserStore::with_demo_users();
        let removed = store.delete("1").unwrap();
        assert_eq!(removed.name, "John Doe");
        assert!(matches!(store.get("1"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete("1"), Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.delete("1.0"),
            Err(StoreError::InvalidArgument(_))
        ));
        assert_eq!(store.len(), 2);
    }
}
