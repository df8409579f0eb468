use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

pub fn hash_password(password: &str) -> String {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
}

pub fn verify_password(password: &str, hashed: &str) -> Result<(), argon2::password_hash::Error> {
    let argon2 = Argon2::default();
    let parsed = PasswordHash::new(hashed)?;

    argon2.verify_password(password.as_bytes(), &parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hashed = hash_password("hunter2");
        assert!(verify_password("hunter2", &hashed).is_ok());
    }

    #[test]
    fn wrong_password_fails() {
        let hashed = hash_password("hunter2");
        assert!(verify_password("hunter3", &hashed).is_err());
    }

    #[test]
    fn salted_hashes_differ() {
        assert_ne!(hash_password("hunter2"), hash_password("hunter2"));
    }
}
