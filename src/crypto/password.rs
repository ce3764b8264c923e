use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::CryptoError;

pub const HASH_SCHEME: &str = "pbkdf2-sha256";
pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 16;

/// Derive a PHC-like record: `pbkdf2-sha256$<iterations>$<salt>$<hash>`,
/// salt and hash base64 without padding.
pub fn hash_password(password: &str, iterations: u32) -> Result<String, CryptoError> {
    if iterations == 0 {
        return Err(CryptoError::InvalidIterations);
    }
    let salt = generate_salt();
    let hash = derive(password, &salt, iterations);
    Ok(format!(
        "{HASH_SCHEME}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    ))
}

/// Check `password` against a record produced by [`hash_password`].
/// The iteration count is read from the record, so changing the configured
/// count does not invalidate existing accounts.
pub fn verify_password(password: &str, stored: &str) -> Result<(), CryptoError> {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) =
        (parts.next(), parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(CryptoError::MalformedHash);
    };
    if scheme != HASH_SCHEME {
        return Err(CryptoError::MalformedHash);
    }
    let iterations: u32 = iterations.parse().map_err(|_| CryptoError::MalformedHash)?;
    if iterations == 0 {
        return Err(CryptoError::MalformedHash);
    }
    let salt = STANDARD_NO_PAD.decode(salt).map_err(|_| CryptoError::MalformedHash)?;
    let expected = STANDARD_NO_PAD.decode(expected).map_err(|_| CryptoError::MalformedHash)?;
    if expected.len() != HASH_LENGTH {
        return Err(CryptoError::MalformedHash);
    }

    let actual = derive(password, &salt, iterations);
    if bool::from(actual.as_slice().ct_eq(expected.as_slice())) {
        Ok(())
    } else {
        Err(CryptoError::WrongPassword)
    }
}

/// Burn the same work as a real verification so that unknown accounts and
/// wrong passwords take comparable time.
pub fn dummy_verify(password: &str, iterations: u32) {
    let salt = [0u8; SALT_LENGTH];
    let _ = derive(password, &salt, iterations.max(1));
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
