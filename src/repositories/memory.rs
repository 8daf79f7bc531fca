use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{NewUser, User};
use crate::repositories::{StoreError, UserStore};

/// インメモリのユーザーストア（開発・テスト用）
///
/// 一意性チェックと挿入は同一ロック内で行う
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録済みユーザー数
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// ID でユーザーを取得（スナップショット）
    pub fn get(&self, user_id: Uuid) -> Option<User> {
        self.lock().get(&user_id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, User>> {
        // パニックしたスレッドが残したデータもそのまま使う
        self.users.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock().values().find(|u| u.email == email).cloned())
    }

    async fn find_by_reset_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()
            .values()
            .find(|u| u.reset_token_hash.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.lock();
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            reset_token_hash: None,
            reset_token_issued_at: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        issued_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        if let Some(user) = self.lock().get_mut(&user_id) {
            user.reset_token_hash = Some(token_hash.to_string());
            user.reset_token_issued_at = Some(issued_at);
            user.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }

    async fn complete_password_reset(
        &self,
        user_id: Uuid,
        token_hash: &str,
        new_password_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut users = self.lock();
        match users.get_mut(&user_id) {
            Some(user) if user.reset_token_hash.as_deref() == Some(token_hash) => {
                user.password_hash = new_password_hash.to_string();
                user.reset_token_hash = None;
                user.reset_token_issued_at = None;
                user.updated_at = OffsetDateTime::now_utc();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
