use tracing::warn;

use crate::error::AppError;

/// Stored hashes all carry a bcrypt `$2a$`/`$2b$`/`$2y$` prefix.
pub fn is_hashed(stored: &str) -> bool {
    stored.starts_with("$2")
}

pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password.as_bytes(), cost))
        .await
        .map_err(|_| AppError::InternalServerError)?
        .map_err(AppError::from)
}

/// A stored value that is not a valid bcrypt hash never matches.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password.as_bytes(), &hash))
        .await
        .map_err(|_| AppError::InternalServerError)?;

    match verified {
        Ok(ok) => Ok(ok),
        Err(e) => {
            warn!("stored password hash is unusable: {}", e);
            Ok(false)
        }
    }
}
