use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::db::Store;
use crate::error::AppError;
use crate::models::{
    AccountCheck, AccountLocation, Courses, LoginResponse, PendingAccount, PendingCourse,
    PendingStatus, Role, User, normalize_code, normalize_sid,
};
use crate::services::password::{hash_password, is_hashed, verify_password};
use crate::services::uploads::{PhotoStore, PhotoUpload};

/// The approval queue for accounts and courses.
///
/// Every mutation is a read-modify-write of whole collections, so all of
/// them run under `write_lock`. Reads go straight to the store.
pub struct ApprovalService {
    store: Arc<dyn Store>,
    bcrypt_cost: u32,
    write_lock: Mutex<()>,
}

impl ApprovalService {
    pub fn new(store: Arc<dyn Store>, bcrypt_cost: u32) -> Self {
        Self {
            store,
            bcrypt_cost,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn list_courses(&self) -> Result<Courses, AppError> {
        self.store.courses().await
    }

    pub async fn login(&self, sid: &str, password: &str) -> Result<LoginResponse, AppError> {
        let sid = normalize_sid(sid);
        if sid.is_empty() || password.is_empty() {
            return Err(AppError::Missing);
        }

        let users = self.store.users().await?;
        let user = users.get(sid).ok_or(AppError::Invalid)?;
        if !verify_password(password, &user.password).await? {
            return Err(AppError::Invalid);
        }

        Ok(LoginResponse {
            sid: sid.to_string(),
            role: user.role,
        })
    }

    pub async fn check_account(&self, sid: &str) -> Result<AccountCheck, AppError> {
        let sid = normalize_sid(sid);
        let location = if self.store.users().await?.contains_key(sid) {
            Some(AccountLocation::Users)
        } else if self.store.pending_accounts().await?.iter().any(|p| p.sid == sid) {
            Some(AccountLocation::Pending)
        } else {
            None
        };

        Ok(AccountCheck {
            exists: location.is_some(),
            location,
        })
    }

    pub async fn submit_account(
        &self,
        sid: &str,
        password: &str,
        photo_path: Option<String>,
    ) -> Result<(), AppError> {
        let sid = normalize_sid(sid);
        let hash = self.hash_new_account(sid, password).await?;

        let _guard = self.write_lock.lock().await;
        let mut pending = self.ensure_sid_available(sid).await?;
        self.enqueue_account(&mut pending, sid, hash, photo_path).await
    }

    /// Like `submit_account`, but the photo is only written once the sid is
    /// known to be free. Returns the stored photo's public path.
    pub async fn submit_account_with_photo(
        &self,
        sid: &str,
        password: &str,
        photo: &PhotoUpload,
        photos: &PhotoStore,
    ) -> Result<String, AppError> {
        photo.validate()?;
        let sid = normalize_sid(sid);
        let hash = self.hash_new_account(sid, password).await?;

        let _guard = self.write_lock.lock().await;
        let mut pending = self.ensure_sid_available(sid).await?;

        let photo_path = photos.save(photo).await?;
        if let Err(e) = self
            .enqueue_account(&mut pending, sid, hash, Some(photo_path.clone()))
            .await
        {
            photos.remove(&photo_path).await;
            return Err(e);
        }

        Ok(photo_path)
    }

    /// Validates and hashes outside the write lock; bcrypt is slow. A sid
    /// that is already taken fails fast here and is re-checked under the lock.
    async fn hash_new_account(&self, sid: &str, password: &str) -> Result<String, AppError> {
        if sid.is_empty() || password.is_empty() {
            return Err(AppError::Missing);
        }
        self.ensure_sid_available(sid).await?;
        hash_password(password, self.bcrypt_cost).await
    }

    async fn ensure_sid_available(&self, sid: &str) -> Result<Vec<PendingAccount>, AppError> {
        let users = self.store.users().await?;
        let pending = self.store.pending_accounts().await?;
        if users.contains_key(sid) || pending.iter().any(|p| p.sid == sid) {
            return Err(AppError::Exists);
        }

        Ok(pending)
    }

    async fn enqueue_account(
        &self,
        pending: &mut Vec<PendingAccount>,
        sid: &str,
        hash: String,
        photo_path: Option<String>,
    ) -> Result<(), AppError> {
        pending.push(PendingAccount {
            sid: sid.to_string(),
            password: hash,
            photo_path,
            status: PendingStatus::Pending,
            ts: Utc::now().timestamp_millis(),
        });
        self.store.set_pending_accounts(pending).await?;

        info!("account request queued: {}", sid);
        Ok(())
    }

    pub async fn pending_accounts(&self) -> Result<Vec<PendingAccount>, AppError> {
        self.store.pending_accounts().await
    }

    /// The pending entry is removed before the user is written. If the user
    /// write fails the pending collection is put back, so a sid is never
    /// left in both collections.
    pub async fn approve_account(&self, sid: &str) -> Result<(), AppError> {
        let sid = normalize_sid(sid);
        let _guard = self.write_lock.lock().await;

        let original = self.store.pending_accounts().await?;
        let idx = original
            .iter()
            .position(|p| p.sid == sid)
            .ok_or(AppError::NotFound)?;
        let mut pending = original.clone();
        let item = pending.remove(idx);

        let mut users = self.store.users().await?;
        users.insert(
            item.sid.clone(),
            User {
                password: item.password,
                role: Role::User,
                photo_path: item.photo_path,
            },
        );

        self.store.set_pending_accounts(&pending).await?;
        if let Err(e) = self.store.set_users(&users).await {
            if let Err(restore) = self.store.set_pending_accounts(&original).await {
                error!("failed to restore pending account {}: {}", sid, restore);
            }
            return Err(e);
        }

        info!("account approved: {}", sid);
        Ok(())
    }

    pub async fn reject_account(&self, sid: &str) -> Result<(), AppError> {
        let sid = normalize_sid(sid);
        let _guard = self.write_lock.lock().await;

        let mut pending = self.store.pending_accounts().await?;
        let before = pending.len();
        pending.retain(|p| p.sid != sid);
        self.store.set_pending_accounts(&pending).await?;

        if pending.len() < before {
            info!("account rejected: {}", sid);
        }
        Ok(())
    }

    pub async fn request_course(&self, code: &str, title: &str) -> Result<(), AppError> {
        let code = normalize_code(code);
        let title = title.trim();
        if code.is_empty() || title.is_empty() {
            return Err(AppError::Missing);
        }

        let _guard = self.write_lock.lock().await;

        let courses = self.store.courses().await?;
        let mut pending = self.store.pending_courses().await?;
        if courses.contains_key(&code) || pending.iter().any(|p| p.code == code) {
            return Err(AppError::Exists);
        }

        pending.push(PendingCourse {
            code: code.clone(),
            title: title.to_string(),
            status: PendingStatus::Pending,
            ts: Utc::now().timestamp_millis(),
        });
        self.store.set_pending_courses(&pending).await?;

        info!("course request queued: {}", code);
        Ok(())
    }

    pub async fn pending_courses(&self) -> Result<Vec<PendingCourse>, AppError> {
        self.store.pending_courses().await
    }

    /// Same ordering as `approve_account`: dequeue, then publish, and put
    /// the queue back if publishing fails.
    pub async fn approve_course(&self, code: &str) -> Result<(), AppError> {
        let code = normalize_code(code);
        let _guard = self.write_lock.lock().await;

        let original = self.store.pending_courses().await?;
        let idx = original
            .iter()
            .position(|p| p.code == code)
            .ok_or(AppError::NotFound)?;
        let mut pending = original.clone();
        let item = pending.remove(idx);

        let mut courses = self.store.courses().await?;
        courses.insert(code.clone(), item.title);

        self.store.set_pending_courses(&pending).await?;
        if let Err(e) = self.store.set_courses(&courses).await {
            if let Err(restore) = self.store.set_pending_courses(&original).await {
                error!("failed to restore pending course {}: {}", code, restore);
            }
            return Err(e);
        }

        info!("course approved: {}", code);
        Ok(())
    }

    pub async fn reject_course(&self, code: &str) -> Result<(), AppError> {
        let code = normalize_code(code);
        let _guard = self.write_lock.lock().await;

        let mut pending = self.store.pending_courses().await?;
        let before = pending.len();
        pending.retain(|p| p.code != code);
        self.store.set_pending_courses(&pending).await?;

        if pending.len() < before {
            info!("course rejected: {}", code);
        }
        Ok(())
    }

    /// Hashes any stored user password that is still plain text, e.g. from
    /// a hand-seeded `users.json`. Returns how many were rewritten.
    pub async fn hash_plaintext_passwords(&self) -> Result<usize, AppError> {
        let _guard = self.write_lock.lock().await;

        let mut users = self.store.users().await?;
        let mut rehashed = 0;
        for (sid, user) in users.iter_mut() {
            if !user.password.is_empty() && !is_hashed(&user.password) {
                info!("hashing plain-text password for {}", sid);
                user.password = hash_password(&user.password, self.bcrypt_cost).await?;
                rehashed += 1;
            }
        }

        if rehashed > 0 {
            self.store.set_users(&users).await?;
        }
        Ok(rehashed)
    }

    /// Creates the configured admin account if that sid is unused.
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, sid: &str, password: &str) -> Result<bool, AppError> {
        let sid = normalize_sid(sid);
        if sid.is_empty() || password.is_empty() {
            return Err(AppError::Missing);
        }

        let _guard = self.write_lock.lock().await;

        let mut users = self.store.users().await?;
        if users.contains_key(sid) {
            return Ok(false);
        }
        if self.store.pending_accounts().await?.iter().any(|p| p.sid == sid) {
            warn!("admin sid {} is awaiting approval; not creating it", sid);
            return Ok(false);
        }

        users.insert(
            sid.to_string(),
            User {
                password: hash_password(password, self.bcrypt_cost).await?,
                role: Role::Admin,
                photo_path: None,
            },
        );
        self.store.set_users(&users).await?;

        info!("created admin account {}", sid);
        Ok(true)
    }
}
