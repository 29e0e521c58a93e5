//! Account and session management.
//!
//! The backend keeps the session in two cookies, `access_token` and
//! `refresh_token`, set by [`Client::login`]. The client's cookie store holds
//! them, so nothing here deals with tokens directly.
//!
//! # Example
//!
//! ```ignore
//! let client = Client::new()?;
//! if !client.check_auth().await? {
//!     client.login("me@example.com", "correct horse").await?;
//! }
//! ```

mod single_flight;

pub use single_flight::SingleFlight;

use crate::client::{ensure_success, http_error, read_envelope, Client};
use crate::protocol::Credentials;
use crate::{Error, Result};

/// Shortest password accepted at signup.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Longest password accepted at signup.
pub const MAX_PASSWORD_LEN: usize = 25;

/// Check signup input before anything is sent.
///
/// Both fields must be non-blank and the password must be between
/// [`MIN_PASSWORD_LEN`] and [`MAX_PASSWORD_LEN`] characters long.
pub fn validate_signup(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(Error::InvalidInput("email must not be empty".into()));
    }
    if password.trim().is_empty() {
        return Err(Error::InvalidInput("password must not be empty".into()));
    }
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(Error::InvalidInput(format!(
            "password must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn credentials(email: &str, password: &str) -> Credentials {
    Credentials {
        email: email.trim().to_string(),
        password: password.to_string(),
    }
}

impl Client {
    /// Create an account.
    ///
    /// Returns the server's confirmation message, if it sent one.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] without sending anything when
    /// [`validate_signup`] rejects the input; [`Error::Http`] when the
    /// server refuses (for example, the email is taken).
    pub async fn signup(&self, email: &str, password: &str) -> Result<Option<String>> {
        validate_signup(email, password)?;

        let url = self.config().url(&self.config().endpoints().signup);
        tracing::debug!(%url, "signing up");
        let response = self
            .http()
            .post(url)
            .json(&credentials(email, password))
            .send()
            .await
            .map_err(Error::Network)?;
        let envelope = read_envelope::<serde_json::Value>(ensure_success(response).await?).await?;
        Ok(envelope.message)
    }

    /// Log in. On success the session cookies are stored in the client.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(Error::InvalidInput(
                "email and password must not be empty".into(),
            ));
        }

        let url = self.config().url(&self.config().endpoints().login);
        tracing::debug!(%url, "logging in");
        let response = self
            .http()
            .post(url)
            .json(&credentials(email, password))
            .send()
            .await
            .map_err(Error::Network)?;

        match ensure_success(response).await {
            Ok(_) => Ok(()),
            Err(Error::Http {
                status: 401 | 403,
                message,
            }) => Err(Error::Auth { message }),
            Err(e) => Err(e),
        }
    }

    /// Whether the stored session is valid.
    ///
    /// `Ok(false)` on 401 or 403. This call never triggers a refresh and is
    /// bounded by the check timeout (default 5 seconds).
    pub async fn check_auth(&self) -> Result<bool> {
        let url = self.config().url(&self.config().endpoints().check);
        let request = self.http().get(url);
        let response = self
            .send_with_deadline(request, self.config().check_timeout())
            .await?;

        match response.status().as_u16() {
            200..=299 => Ok(true),
            401 | 403 => {
                tracing::debug!(status = response.status().as_u16(), "session not valid");
                Ok(false)
            }
            _ => Err(http_error(response).await),
        }
    }

    /// Exchange the refresh cookie for a new access cookie.
    ///
    /// Concurrent calls share one request.
    pub async fn refresh(&self) -> Result<()> {
        let http = self.http().clone();
        let url = self.config().url(&self.config().endpoints().refresh);

        self.refresh_coordinator()
            .run(move || async move {
                let response = http.get(url).send().await.map_err(Error::Network)?;
                ensure_success(response).await.map(|_| ())
            })
            .await
    }

    /// End the session.
    pub async fn logout(&self) -> Result<()> {
        let url = self.config().url(&self.config().endpoints().logout);
        tracing::debug!(%url, "logging out");
        let response = self.http().post(url).send().await.map_err(Error::Network)?;
        ensure_success(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_accepts_valid_input() {
        assert!(validate_signup("me@example.com", "12345678").is_ok());
        assert!(validate_signup("me@example.com", &"x".repeat(25)).is_ok());
    }

    #[test]
    fn signup_rejects_blank_fields() {
        assert!(matches!(
            validate_signup("", "12345678"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            validate_signup("me@example.com", "        "),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn signup_password_length_bounds() {
        assert!(validate_signup("me@example.com", "1234567").is_err());
        assert!(validate_signup("me@example.com", &"x".repeat(26)).is_err());
    }

    #[test]
    fn password_length_counts_characters() {
        // 8 characters, 16 bytes
        assert!(validate_signup("me@example.com", "éééééééé").is_ok());
    }

    #[test]
    fn credentials_trim_email_only() {
        let creds = credentials(" me@example.com ", " pass word ");
        assert_eq!(creds.email, "me@example.com");
        assert_eq!(creds.password, " pass word ");
    }
}
