use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const MIN_PASSWORD_LEN: usize = 6;

/// A local demo account. The secret is kept as an unsalted SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub email: String,
    pub secret_digest: String,
    pub created_at: i64,
}

impl Account {
    pub fn matches_email(&self, email: &str) -> bool {
        self.email.to_lowercase() == email.to_lowercase()
    }

    fn secret_matches(&self, password: &str) -> bool {
        self.secret_digest == digest_secret(password)
    }
}

pub fn digest_secret(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

fn check_password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn register(
    accounts: &mut Vec<Account>,
    email: &str,
    password: &str,
    confirm: &str,
    now: i64,
) -> Result<(), DomainError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(DomainError::Validation("email required".to_string()));
    }
    check_password(password)?;
    if password != confirm {
        return Err(DomainError::Validation("passwords do not match".to_string()));
    }
    if accounts.iter().any(|a| a.matches_email(email)) {
        return Err(DomainError::Validation(
            "account already exists, please login".to_string(),
        ));
    }
    accounts.push(Account {
        email: email.to_string(),
        secret_digest: digest_secret(password),
        created_at: now,
    });
    Ok(())
}

/// Returns the stored account on a match. The stored email keeps its
/// original casing.
pub fn login<'a>(
    accounts: &'a [Account],
    email: &str,
    password: &str,
) -> Result<&'a Account, DomainError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(DomainError::Validation(
            "enter email and password".to_string(),
        ));
    }
    let account = accounts
        .iter()
        .find(|a| a.matches_email(email))
        .ok_or_else(|| DomainError::NotFound("account not found, please create one".to_string()))?;
    if !account.secret_matches(password) {
        return Err(DomainError::AuthFailed("wrong password, try again".to_string()));
    }
    Ok(account)
}

pub fn change_password(
    accounts: &mut [Account],
    email: &str,
    new_password: &str,
) -> Result<(), DomainError> {
    let new_password = new_password.trim();
    check_password(new_password)?;
    let account = accounts
        .iter_mut()
        .find(|a| a.matches_email(email))
        .ok_or_else(|| DomainError::NotFound("account not found".to_string()))?;
    account.secret_digest = digest_secret(new_password);
    Ok(())
}

pub fn remove(accounts: &mut Vec<Account>, email: &str) -> bool {
    let before = accounts.len();
    accounts.retain(|a| !a.matches_email(email));
    accounts.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered(email: &str, password: &str) -> Vec<Account> {
        let mut accounts = Vec::new();
        register(&mut accounts, email, password, password, 42).expect("register");
        accounts
    }

    #[test]
    fn login_ignores_email_case() {
        let accounts = registered("X@Y.com", "secret1");
        let account = login(&accounts, "x@y.com", "secret1").expect("login");
        assert_eq!(account.email, "X@Y.com");
        assert_eq!(account.created_at, 42);
    }

    #[test]
    fn duplicate_registration_is_case_insensitive() {
        let mut accounts = registered("X@Y.com", "secret1");
        let e = register(&mut accounts, " x@y.COM ", "secret2", "secret2", 43)
            .expect_err("duplicate");
        assert_eq!(e.code(), "validation_failed");
        assert_eq!(accounts.len(), 1);
    }

    #[test]
    fn registration_validates_fields() {
        let mut accounts = Vec::new();
        assert!(register(&mut accounts, "  ", "secret1", "secret1", 0).is_err());
        assert!(register(&mut accounts, "a@b.c", "short", "short", 0).is_err());
        assert!(register(&mut accounts, "a@b.c", "secret1", "secret2", 0).is_err());
        assert!(accounts.is_empty());
    }

    #[test]
    fn login_failures_are_distinguished() {
        let accounts = registered("a@b.c", "secret1");
        assert_eq!(
            login(&accounts, "", "secret1").expect_err("empty").code(),
            "validation_failed"
        );
        assert_eq!(
            login(&accounts, "nobody@b.c", "secret1").expect_err("unknown").code(),
            "not_found"
        );
        assert_eq!(
            login(&accounts, "a@b.c", "wrong-pw").expect_err("wrong").code(),
            "auth_failed"
        );
    }

    #[test]
    fn secrets_are_not_stored_in_clear() {
        let accounts = registered("a@b.c", "secret1");
        let raw = serde_json::to_string(&accounts).expect("serialize");
        assert!(!raw.contains("secret1"));
        assert!(raw.contains("secretDigest"));
    }

    #[test]
    fn password_change_replaces_the_secret() {
        let mut accounts = registered("a@b.c", "secret1");
        assert!(change_password(&mut accounts, "A@B.C", "tiny").is_err());
        change_password(&mut accounts, "A@B.C", "  newsecret ").expect("change");
        assert!(login(&accounts, "a@b.c", "secret1").is_err());
        assert!(login(&accounts, "a@b.c", "newsecret").is_ok());
        assert_eq!(
            change_password(&mut accounts, "gone@b.c", "newsecret")
                .expect_err("missing")
                .code(),
            "not_found"
        );
    }

    #[test]
    fn removal_matches_any_case() {
        let mut accounts = registered("a@b.c", "secret1");
        assert!(remove(&mut accounts, "A@B.C"));
        assert!(!remove(&mut accounts, "A@B.C"));
        assert!(accounts.is_empty());
    }
}
