use async_session::async_trait;
use axum_login::{AuthUser, AuthnBackend, UserId};
use serde::Deserialize;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::convert::Infallible;

/// The site has one administrator, identified only by the shared password.
pub const ADMIN_ID: i64 = 1;

#[derive(Clone)]
pub struct AdminUser {
    id: i64,
    pw_hash: Vec<u8>,
}

impl std::fmt::Debug for AdminUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminUser").field("id", &self.id).finish()
    }
}

impl AuthUser for AdminUser {
    type Id = i64;

    fn id(&self) -> Self::Id {
        self.id
    }

    // Changing ADMIN_PASSWORD invalidates every existing admin session.
    fn session_auth_hash(&self) -> &[u8] {
        &self.pw_hash
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

type HmacSha256 = Hmac<Sha256>;

const PASSWORD_CONTEXT: &[u8] = b"carshow-votes admin password";

fn password_mac(password: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(PASSWORD_CONTEXT).ok()?;
    mac.update(password.as_bytes());
    Some(mac)
}

fn hash_password(password: &str) -> Vec<u8> {
    password_mac(password)
        .map(|mac| mac.finalize().into_bytes().to_vec())
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct Backend {
    admin: AdminUser,
}

impl Backend {
    pub fn new(admin_password: &str) -> Self {
        Self {
            admin: AdminUser {
                id: ADMIN_ID,
                pw_hash: hash_password(admin_password),
            },
        }
    }
}

#[async_trait]
impl AuthnBackend for Backend {
    type User = AdminUser;
    type Credentials = Credentials;
    type Error = Infallible;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        // verify_slice compares in constant time.
        let matches = password_mac(&creds.password)
            .is_some_and(|mac| mac.verify_slice(&self.admin.pw_hash).is_ok());
        if matches {
            Ok(Some(self.admin.clone()))
        } else {
            Ok(None)
        }
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        Ok((*user_id == self.admin.id).then(|| self.admin.clone()))
    }
}

pub type AuthSession = axum_login::AuthSession<Backend>;
