use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;

lazy_static! {
    /// Hash checked when the account does not exist, so that login path does
    /// the same argon2 work as a real one.
    static ref DECOY_HASH: Option<String> = hash_password("recipebox-decoy-password").ok();
}

/// Hashes `plain` into an argon2 PHC string with a fresh random salt.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("argon2 hash: {e}"))
}

/// `Ok(false)` for a wrong password; `Err` only when the stored hash is unreadable.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| anyhow::anyhow!("argon2 parse: {e}"))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Burns one argon2 verification for a login whose account was not found.
pub fn verify_decoy(plain: &str) {
    match DECOY_HASH.as_deref() {
        Some(hash) => {
            let _ = verify_password(plain, hash);
        }
        None => {
            let _ = hash_password(plain);
        }
    }
}
