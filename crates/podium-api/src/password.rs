//! Scrypt password hashing, stored as `hex(derived_key).hex(salt)`.

use anyhow::{Context, Result, anyhow};
use rand::RngCore;
use scrypt::Params;
use subtle::ConstantTimeEq;

const DERIVED_KEY_LEN: usize = 64;
const SALT_LEN: usize = 16;
const LOG_N: u8 = 14; // N = 16384

fn params() -> Result<Params> {
    Params::new(LOG_N, 8, 1, DERIVED_KEY_LEN).map_err(|e| anyhow!("invalid scrypt params: {e}"))
}

pub fn hash_password(password: &str) -> Result<String> {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);

    let mut derived = [0u8; DERIVED_KEY_LEN];
    scrypt::scrypt(password.as_bytes(), &salt, &params()?, &mut derived)
        .map_err(|e| anyhow!("scrypt derivation failed: {e}"))?;

    Ok(format!("{}.{}", hex::encode(derived), hex::encode(salt)))
}

/// Re-derives the key from the supplied password and compares it against the
/// stored key in constant time.
pub fn verify_password(stored: &str, supplied: &str) -> Result<bool> {
    let (key_hex, salt_hex) = stored
        .split_once('.')
        .ok_or_else(|| anyhow!("malformed password hash"))?;
    let key = hex::decode(key_hex).context("malformed password hash")?;
    let salt = hex::decode(salt_hex).context("malformed password hash")?;

    let mut derived = vec![0u8; key.len()];
    scrypt::scrypt(supplied.as_bytes(), &salt, &params()?, &mut derived)
        .map_err(|e| anyhow!("scrypt derivation failed: {e}"))?;

    Ok(derived.ct_eq(&key).into())
}
