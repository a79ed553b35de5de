use bcrypt::{hash, verify, DEFAULT_COST};

pub fn hash_password(plain: &str) -> Result<String, String> {
    hash(plain, DEFAULT_COST).map_err(|e| e.to_string())
}

pub fn verify_password(plain: &str, hashed: &str) -> Result<bool, String> {
    verify(plain, hashed).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let h = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &h).unwrap());
        assert!(!verify_password("hunter23", &h).unwrap());
    }
}
