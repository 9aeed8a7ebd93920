//! Embedded [`AuthProvider`] over the SQLite `accounts` table.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::RngCore;
use rusqlite::params;
use tokio::sync::watch;
use tracing::info;
use wayfarer_shared::constants::MIN_PASSWORD_LEN;
use wayfarer_shared::{AuthError, User, UserId};

use crate::auth::AuthProvider;
use crate::error::{BackendError, Result};

use super::database::Database;

/// Embedded account registry and session holder.
///
/// Passwords are stored as salted blake3 digests; provider and guest
/// accounts carry empty salt/digest columns and can never sign in by
/// password.
pub struct LocalAuth {
    db: Arc<Database>,
    session: watch::Sender<Option<User>>,
}

fn digest_password(salt: &[u8], password: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_hex().to_string()
}

impl LocalAuth {
    pub fn new(db: Arc<Database>) -> Self {
        let (session, _) = watch::channel(None);
        Self { db, session }
    }

    fn find_by_email(&self, email: &str) -> Result<Option<AccountRow>> {
        self.db.with(|conn| {
            conn.query_row(
                "SELECT id, email, password_salt, password_digest, display_name,
                        is_anonymous, photo_url, created_at
                 FROM accounts WHERE email = ?1",
                params![email],
                row_to_account,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(BackendError::Sqlite(other)),
            })
        })
    }

    fn insert_account(&self, row: &AccountRow) -> Result<()> {
        self.db.with(|conn| {
            conn.execute(
                "INSERT INTO accounts
                     (id, email, password_salt, password_digest, display_name,
                      is_anonymous, photo_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    row.id,
                    row.email,
                    row.salt,
                    row.digest,
                    row.display_name,
                    row.is_anonymous,
                    row.photo_url,
                    row.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    fn establish(&self, user: User) -> User {
        // Session observers see the new identity before the call returns.
        self.session.send_replace(Some(user.clone()));
        user
    }
}

#[async_trait]
impl AuthProvider for LocalAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim().to_lowercase();
        let row = self
            .find_by_email(&email)?
            .ok_or(AuthError::InvalidCredentials)?;

        if row.salt.is_empty() {
            // Provider/guest account: no password sign-in.
            return Err(AuthError::InvalidCredentials.into());
        }

        let salt = hex::decode(&row.salt).map_err(|_| AuthError::InvalidCredentials)?;
        if digest_password(&salt, password) != row.digest {
            return Err(AuthError::InvalidCredentials.into());
        }

        info!(user = %row.id, "signed in");
        Ok(self.establish(row.into_user()))
    }

    async fn register(&self, email: &str, password: &str, display_name: &str) -> Result<User> {
        let email = email.trim().to_lowercase();
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword.into());
        }
        if self.find_by_email(&email)?.is_some() {
            return Err(AuthError::EmailAlreadyInUse.into());
        }

        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);

        let row = AccountRow {
            id: UserId::new().0,
            email,
            salt: hex::encode(salt),
            digest: digest_password(&salt, password),
            display_name: display_name.trim().to_string(),
            is_anonymous: false,
            photo_url: None,
            created_at: Utc::now(),
        };
        self.insert_account(&row)?;

        info!(user = %row.id, "registered account");
        Ok(self.establish(row.into_user()))
    }

    async fn sign_in_anonymously(&self) -> Result<User> {
        let id = UserId::new().0;
        let row = AccountRow {
            email: format!("guest-{id}@anonymous.local"),
            id,
            salt: String::new(),
            digest: String::new(),
            display_name: "Guest".to_string(),
            is_anonymous: true,
            photo_url: None,
            created_at: Utc::now(),
        };
        self.insert_account(&row)?;

        info!(user = %row.id, "signed in anonymously");
        Ok(self.establish(row.into_user()))
    }

    async fn sign_in_with_token(&self, token: &str) -> Result<User> {
        // The token maps deterministically onto an account so repeat
        // sign-ins keep a stable user id.
        let tag = hex::encode(&blake3::hash(token.as_bytes()).as_bytes()[..8]);
        let email = format!("ext-{tag}@provider.local");

        if let Some(row) = self.find_by_email(&email)? {
            return Ok(self.establish(row.into_user()));
        }

        let row = AccountRow {
            id: UserId::new().0,
            email,
            salt: String::new(),
            digest: String::new(),
            display_name: "Traveler".to_string(),
            is_anonymous: false,
            photo_url: None,
            created_at: Utc::now(),
        };
        self.insert_account(&row)?;

        info!(user = %row.id, "signed in via external provider");
        Ok(self.establish(row.into_user()))
    }

    async fn sign_out(&self) -> Result<()> {
        self.session.send_replace(None);
        Ok(())
    }

    async fn delete_current_user(&self) -> Result<()> {
        let user = self.current_user().ok_or(AuthError::NotSignedIn)?;
        self.db.with(|conn| {
            conn.execute("DELETE FROM accounts WHERE id = ?1", params![user.id.0])?;
            Ok(())
        })?;
        info!(user = %user.id, "deleted account data");
        Ok(())
    }

    fn current_user(&self) -> Option<User> {
        self.session.borrow().clone()
    }

    fn watch_session(&self) -> watch::Receiver<Option<User>> {
        self.session.subscribe()
    }
}

/// Raw `accounts` row.
struct AccountRow {
    id: String,
    email: String,
    salt: String,
    digest: String,
    display_name: String,
    is_anonymous: bool,
    photo_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_user(self) -> User {
        User {
            id: UserId(self.id),
            display_name: self.display_name,
            email: self.email,
            is_anonymous: self.is_anonymous,
            photo_url: self.photo_url,
            created_at: self.created_at,
        }
    }
}

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<AccountRow> {
    let created_str: String = row.get(7)?;
    let created_at = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(AccountRow {
        id: row.get(0)?,
        email: row.get(1)?,
        salt: row.get(2)?,
        digest: row.get(3)?,
        display_name: row.get(4)?,
        is_anonymous: row.get(5)?,
        photo_url: row.get(6)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> LocalAuth {
        LocalAuth::new(Arc::new(Database::in_memory().unwrap()))
    }

    #[tokio::test]
    async fn register_then_sign_in() {
        let auth = auth();
        let user = auth
            .register("asha@example.com", "correct-horse", "Asha")
            .await
            .unwrap();
        assert!(!user.is_anonymous);

        auth.sign_out().await.unwrap();
        assert!(auth.current_user().is_none());

        let back = auth.sign_in("asha@example.com", "correct-horse").await.unwrap();
        assert_eq!(back.id, user.id);
    }

    #[tokio::test]
    async fn wrong_password_rejected() {
        let auth = auth();
        auth.register("asha@example.com", "correct-horse", "Asha")
            .await
            .unwrap();

        let err = auth.sign_in("asha@example.com", "wrong").await.unwrap_err();
        assert!(matches!(
            err,
            BackendError::Auth(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let auth = auth();
        auth.register("asha@example.com", "correct-horse", "Asha")
            .await
            .unwrap();
        let err = auth
            .register("Asha@Example.com", "other-password", "Imposter")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BackendError::Auth(AuthError::EmailAlreadyInUse)
        ));
    }

    #[tokio::test]
    async fn short_password_is_weak() {
        let auth = auth();
        let err = auth.register("a@b.c", "short", "A").await.unwrap_err();
        assert!(matches!(err, BackendError::Auth(AuthError::WeakPassword)));
    }

    #[tokio::test]
    async fn token_sign_in_keeps_stable_id() {
        let auth = auth();
        let first = auth.sign_in_with_token("oauth-token").await.unwrap();
        auth.sign_out().await.unwrap();
        let second = auth.sign_in_with_token("oauth-token").await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn session_stream_tracks_changes() {
        let auth = auth();
        let rx = auth.watch_session();
        assert!(rx.borrow().is_none());

        auth.sign_in_anonymously().await.unwrap();
        assert!(rx.borrow().as_ref().unwrap().is_anonymous);

        auth.sign_out().await.unwrap();
        assert!(rx.borrow().is_none());
    }

    #[tokio::test]
    async fn delete_keeps_session_until_sign_out() {
        let auth = auth();
        let guest = auth.sign_in_anonymously().await.unwrap();

        auth.delete_current_user().await.unwrap();
        // The session is still live; only sign_out invalidates it.
        assert_eq!(auth.current_user().map(|u| u.id), Some(guest.id));

        auth.sign_out().await.unwrap();
        assert!(auth.current_user().is_none());
    }
}
