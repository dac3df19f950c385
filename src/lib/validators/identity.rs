use crate::database_drivers::Connector;
use crate::error::{Error, ValidationError};
use regex::Regex;
use std::sync::OnceLock;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9_.+-]+@([a-z0-9-]+\.)+[a-z]{2,}$").expect("valid email pattern")
    })
}

/// Format check first, then a lookup so the email is not registered twice.
pub async fn validate_email(connector: &dyn Connector, value: &str) -> Result<String, Error> {
    let email = value.trim().to_lowercase();

    if !email_pattern().is_match(&email) {
        return Err(ValidationError::new("validate_email", "Value is not valid for a email").into());
    }

    let rows = connector
        .fetch("SELECT id FROM users WHERE email = ?", &[email.as_str().into()])
        .await?;
    if !rows.is_empty() {
        return Err(ValidationError::new("validate_email", "Email already registered!").into());
    }

    Ok(email)
}

pub async fn validate_username(connector: &dyn Connector, value: &str) -> Result<String, Error> {
    let username = value.trim();

    let rows = connector
        .fetch("SELECT id FROM users WHERE username = ?", &[username.into()])
        .await?;
    if !rows.is_empty() {
        return Err(ValidationError::new("validate_username", "Username already exists").into());
    }

    Ok(username.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::database_test_utils::{insert_user, provisioned_sqlite};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_email_free() {
        let tmp_dir = tempdir().unwrap();
        let connector = provisioned_sqlite(&tmp_dir).await;

        let email = validate_email(&connector, " Ada@Example.com ").await.unwrap();
        assert_eq!(email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_email_taken() {
        let tmp_dir = tempdir().unwrap();
        let connector = provisioned_sqlite(&tmp_dir).await;
        insert_user(&connector, "ada", "ada@example.com").await;

        let err = validate_email(&connector, "ada@example.com").await.unwrap_err();
        assert_eq!(err.origin(), Some("validate_email"));
        assert_eq!(err.to_string(), "Email already registered!");
    }

    #[tokio::test]
    async fn test_email_format() {
        let tmp_dir = tempdir().unwrap();
        let connector = provisioned_sqlite(&tmp_dir).await;

        for value in ["", "ada", "ada@", "ada@example", "ada@example.c", "a da@example.com"] {
            let err = validate_email(&connector, value).await.unwrap_err();
            assert_eq!(err.to_string(), "Value is not valid for a email", "{:?}", value);
        }
    }

    #[tokio::test]
    async fn test_username_free_and_taken() {
        let tmp_dir = tempdir().unwrap();
        let connector = provisioned_sqlite(&tmp_dir).await;

        assert_eq!(validate_username(&connector, " ada ").await.unwrap(), "ada");

        insert_user(&connector, "ada", "ada@example.com").await;
        let err = validate_username(&connector, "ada").await.unwrap_err();
        assert_eq!(err.origin(), Some("validate_username"));
        assert_eq!(err.to_string(), "Username already exists");
    }

    #[tokio::test]
    async fn test_storage_failure_is_a_database_error() {
        let tmp_dir = tempdir().unwrap();
        // no schema, so the lookup itself fails
        let connector = crate::test_utils::database_test_utils::sqlite_connector(&tmp_dir);

        let err = validate_username(&connector, "ada").await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert_eq!(err.origin(), None);
    }
}
