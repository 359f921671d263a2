//! Registered customers.

use crate::store::{Database, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields for a new account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

impl Database {
    /// Insert a user, rejecting a taken username or email.
    pub fn create_user(&self, new: NewUser) -> Result<u64, StoreError> {
        let mut tables = self.write()?;
        let taken = tables
            .users
            .iter()
            .any(|u| u.username == new.username || u.email.eq_ignore_ascii_case(&new.email));
        if taken {
            return Err(StoreError::DuplicateUser);
        }

        let id = tables.users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        tables.users.push(User {
            id,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
        });
        Ok(id)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    pub fn user(&self, id: u64) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }
}
