//! Argon2id credential hashing.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$m=...`), so the
//! parameters a hash was produced with travel with it and verification
//! keeps working after the configured cost changes.

use crate::auth::AuthError;
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use std::sync::{Arc, OnceLock};

/// One-way password hashing with a tunable adaptive cost.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
    // Hash of a throwaway password at the configured cost, built on first use
    decoy: Arc<OnceLock<Option<String>>>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::with_params(Params::default())
    }
}

impl PasswordHasher {
    /// Creates a hasher with explicit Argon2 cost parameters.
    ///
    /// # Arguments
    /// * `memory_kib` - Memory cost in KiB
    /// * `iterations` - Number of passes
    /// * `parallelism` - Degree of parallelism (lanes)
    pub fn from_cost(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, AuthError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AuthError::HashingFailure(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Self::with_params(params))
    }

    fn with_params(params: Params) -> Self {
        Self {
            params,
            decoy: Arc::new(OnceLock::new()),
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes a password with a fresh random salt.
    ///
    /// Returns a PHC-formatted hash string. Failure means the process could
    /// not get randomness or memory for the hash; it fails the request only.
    pub fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::HashingFailure(e.to_string()))
    }

    /// Verifies a password against a stored PHC hash.
    ///
    /// A corrupt stored hash and a wrong password both surface as
    /// [`AuthError::WrongPassword`]; only the log tells them apart.
    pub fn verify(&self, stored_hash: &str, plaintext: &str) -> Result<(), AuthError> {
        let parsed_hash = PasswordHash::new(stored_hash).map_err(|e| {
            tracing::warn!(error = %e, "stored credential is not a valid PHC hash");
            AuthError::WrongPassword
        })?;

        self.argon2()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::WrongPassword)
    }

    fn decoy_hash(&self) -> Option<&str> {
        self.decoy
            .get_or_init(|| match self.hash("devbook-unknown-account") {
                Ok(hash) => Some(hash),
                Err(e) => {
                    tracing::error!(error = %e, "failed to build decoy hash");
                    None
                }
            })
            .as_deref()
    }

    /// Rejects a login for an account that does not exist.
    ///
    /// Runs a full verification against a decoy hash so the response takes
    /// as long as a wrong password for a real account. Always returns
    /// [`AuthError::WrongPassword`].
    pub fn reject_unknown(&self, plaintext: &str) -> AuthError {
        if let Some(decoy) = self.decoy_hash() {
            let _ = self.verify(decoy, plaintext);
        }
        AuthError::WrongPassword
    }

    /// [`reject_unknown`](Self::reject_unknown) on the blocking thread pool.
    pub async fn reject_unknown_blocking(&self, plaintext: String) -> AuthError {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.reject_unknown(&plaintext))
            .await
            .unwrap_or(AuthError::WrongPassword)
    }

    /// [`hash`](Self::hash) on the blocking thread pool.
    pub async fn hash_blocking(&self, plaintext: String) -> Result<String, AuthError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AuthError::HashingFailure(format!("Hashing task failed: {}", e)))?
    }

    /// [`verify`](Self::verify) on the blocking thread pool.
    pub async fn verify_blocking(
        &self,
        stored_hash: String,
        plaintext: String,
    ) -> Result<(), AuthError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&stored_hash, &plaintext))
            .await
            .map_err(|e| AuthError::HashingFailure(format!("Verification task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_hasher() -> PasswordHasher {
        // Minimal cost keeps the suite fast
        PasswordHasher::from_cost(1024, 1, 1).expect("valid params")
    }

    #[test]
    fn test_password_hashing() {
        let hasher = create_test_hasher();
        let password = "test_password_123";

        let hash = hasher.hash(password).expect("should hash password");

        assert_ne!(hash, password);
        assert!(hash.starts_with("$argon2id$"), "hash should be in PHC format");
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let hasher = create_test_hasher();

        let first = hasher.hash("same").expect("should hash");
        let second = hasher.hash("same").expect("should hash");

        assert_ne!(first, second, "each hash should use a fresh salt");
    }

    #[test]
    fn test_verify_scenario() {
        let hasher = create_test_hasher();
        let hash = hasher.hash("secret123").expect("should hash password");

        assert_eq!(hasher.verify(&hash, "secret123"), Ok(()));
        assert_eq!(
            hasher.verify(&hash, "secret124"),
            Err(AuthError::WrongPassword)
        );
    }

    #[test]
    fn test_verify_rejects_any_other_plaintext() {
        let hasher = create_test_hasher();
        let hash = hasher.hash("correct horse").expect("should hash");

        for wrong in ["", "correct", "correct horse ", "Correct horse", "correct horsf"] {
            assert_eq!(
                hasher.verify(&hash, wrong),
                Err(AuthError::WrongPassword),
                "{wrong:?} must not verify"
            );
        }
    }

    #[test]
    fn test_corrupt_hash_looks_like_wrong_password() {
        let hasher = create_test_hasher();

        assert_eq!(
            hasher.verify("not-a-phc-string", "whatever"),
            Err(AuthError::WrongPassword)
        );
    }

    #[test]
    fn test_verification_uses_parameters_from_hash() {
        let cheap = create_test_hasher();
        let hash = cheap.hash("portable").expect("should hash");

        let other = PasswordHasher::from_cost(2048, 2, 1).expect("valid params");
        assert_eq!(other.verify(&hash, "portable"), Ok(()));
    }

    #[test]
    fn test_invalid_cost_is_rejected() {
        let result = PasswordHasher::from_cost(0, 0, 0);
        assert!(matches!(result, Err(AuthError::HashingFailure(_))));
    }

    #[test]
    fn test_unknown_account_runs_full_verification() {
        let hasher = create_test_hasher();
        let shared = hasher.clone();
        assert!(hasher.decoy.get().is_none());

        assert_eq!(hasher.reject_unknown("anything"), AuthError::WrongPassword);

        // The decoy is built at the configured cost and shared with clones
        let decoy = shared.decoy.get().cloned().flatten().expect("decoy hash");
        assert!(decoy.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
        assert_eq!(
            shared.reject_unknown("devbook-unknown-account"),
            AuthError::WrongPassword
        );
    }

    #[tokio::test]
    async fn test_reject_unknown_on_blocking_pool() {
        let hasher = create_test_hasher();

        assert_eq!(
            hasher.reject_unknown_blocking("guess".to_string()).await,
            AuthError::WrongPassword
        );
        assert!(hasher.decoy.get().is_some());
    }

    #[tokio::test]
    async fn test_blocking_variants() {
        let hasher = create_test_hasher();

        let hash = hasher
            .hash_blocking("secret123".to_string())
            .await
            .expect("should hash");

        assert_eq!(
            hasher
                .verify_blocking(hash.clone(), "secret123".to_string())
                .await,
            Ok(())
        );
        assert_eq!(
            hasher.verify_blocking(hash, "nope".to_string()).await,
            Err(AuthError::WrongPassword)
        );
    }
}
