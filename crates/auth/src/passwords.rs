use dockhand_models::DockhandError;

pub fn hash_password(plain: &str) -> Result<String, DockhandError> {
    bcrypt::hash(plain, bcrypt::DEFAULT_COST).map_err(|e| DockhandError::InternalError {
        reason: e.to_string(),
    })
}

/// Verification failure and malformed hashes both read as a mismatch.
pub fn verify_password(plain: &str, hashed: &str) -> bool {
    bcrypt::verify(plain, hashed).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }
}
