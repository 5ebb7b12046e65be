use bcrypt::{hash, verify};
use crate::errors::{AppError, AppResult};

// bcrypt is CPU bound, so both calls leave the async worker threads.

pub async fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash(password.as_bytes(), cost))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(AppError::from)
}

pub async fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let password_hash = password_hash.to_string();
    tokio::task::spawn_blocking(move || verify(password.as_bytes(), &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))?
        .map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hashed = hash_password("pw1", 4).await.unwrap();
        assert_ne!(hashed, "pw1");
        assert!(verify_password("pw1", &hashed).await.unwrap());
        assert!(!verify_password("pw2", &hashed).await.unwrap());
    }
}
