//! Password hashing for owner accounts.
//!
//! Hashes are stored as `pbkdf2_sha256$<iterations>$<salt>$<base64 hash>`, so
//! the iteration count can be raised later without invalidating old hashes.

use base64::{engine::general_purpose, Engine as _};
use constant_time_eq::constant_time_eq;
use pbkdf2::{hmac::Hmac, pbkdf2};
use rand::{distributions::Alphanumeric, Rng};
use sha2::Sha256;

const ALGORITHM: &str = "pbkdf2_sha256";
const SALT_LENGTH: usize = 16;
const HASH_LENGTH: usize = 32;

pub const DEFAULT_ITERATIONS: u32 = 600_000;
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct Credentials {
    pub iterations: u32,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl Credentials {
    pub fn with_iterations(iterations: u32) -> Self {
        Self { iterations }
    }

    pub fn hash_password(&self, password: &str) -> String {
        let salt: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SALT_LENGTH)
            .map(char::from)
            .collect();
        let hash = derive(password, &salt, self.iterations);
        format!("{}${}${}${}", ALGORITHM, self.iterations, salt, hash)
    }

    /// Checks `password` against a stored hash. Malformed hashes never verify.
    pub fn verify_password(&self, password: &str, stored: &str) -> bool {
        let parts: Vec<&str> = stored.split('$').collect();
        if parts.len() != 4 || parts[0] != ALGORITHM {
            return false;
        }
        let iterations: u32 = match parts[1].parse() {
            Ok(iterations) if iterations > 0 => iterations,
            _ => return false,
        };
        let computed = derive(password, parts[2], iterations);
        constant_time_eq(computed.as_bytes(), parts[3].as_bytes())
    }
}

fn derive(password: &str, salt: &str, iterations: u32) -> String {
    let mut output = [0u8; HASH_LENGTH];
    // only fails for output lengths hmac cannot produce
    let _ = pbkdf2::<Hmac<Sha256>>(
        password.as_bytes(),
        salt.as_bytes(),
        iterations,
        &mut output,
    );
    general_purpose::STANDARD.encode(output)
}

#[cfg(test)]
mod tests {
    use super::Credentials;

    fn fast() -> Credentials {
        Credentials::with_iterations(1_000)
    }

    #[test]
    fn hash_then_verify() {
        let credentials = fast();
        let hash = credentials.hash_password("correct horse");
        assert!(hash.starts_with("pbkdf2_sha256$1000$"));
        assert!(credentials.verify_password("correct horse", &hash));
        assert!(!credentials.verify_password("wrong horse", &hash));
    }

    #[test]
    fn salts_differ() {
        let credentials = fast();
        let a = credentials.hash_password("same");
        let b = credentials.hash_password("same");
        assert_ne!(a, b);
    }

    #[test]
    fn stored_iteration_count_wins() {
        let hash = fast().hash_password("secret-password");
        let stronger = Credentials::with_iterations(2_000);
        assert!(stronger.verify_password("secret-password", &hash));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        let credentials = fast();
        assert!(!credentials.verify_password("x", ""));
        assert!(!credentials.verify_password("x", "sha256$abc"));
        assert!(!credentials.verify_password("x", "pbkdf2_sha256$zero$salt$hash"));
        assert!(!credentials.verify_password("x", "pbkdf2_sha256$0$salt$hash"));
    }
}
