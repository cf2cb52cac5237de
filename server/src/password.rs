use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use color_eyre::eyre::{eyre, WrapErr as _};
use tracing::instrument;
use uuid::Uuid;

/// Hash a password using a randomly-generated salt value
#[instrument(skip_all)]
pub async fn new_hash(password: String) -> color_eyre::Result<String> {
    let salt = Uuid::new_v4();

    tokio::task::spawn_blocking(move || {
        let salt = SaltString::encode_b64(salt.as_bytes())
            .map_err(|e| eyre!("Failed to encode password salt: {e}"))?;

        let hash = Argon2::default()
            .hash_password(password.as_bytes(), salt.as_salt())
            .map_err(|e| eyre!("Failed to hash password: {e}"))?;

        Ok::<_, color_eyre::Report>(hash.to_string())
    })
    .await
    .wrap_err("Password hashing task panicked")?
}

/// Whether `password` matches the stored hash. A malformed hash is an error.
#[instrument(skip_all)]
pub async fn verify_password(password: String, hash: String) -> color_eyre::Result<bool> {
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(&hash).map_err(|e| eyre!("Stored password hash is invalid: {e}"))?;

        let matches = Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok();
        Ok::<_, color_eyre::Report>(matches)
    })
    .await
    .wrap_err("Password verification task panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() -> color_eyre::Result<()> {
        let hash = new_hash("correct horse battery staple".to_string()).await?;

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery staple".to_string(), hash.clone()).await?);
        assert!(!verify_password("wrong".to_string(), hash).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_hash_is_an_error() {
        assert!(verify_password("pw".to_string(), "not-a-hash".to_string())
            .await
            .is_err());
    }
}
