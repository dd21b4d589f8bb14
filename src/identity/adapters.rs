//! Login-code notifiers for development and tests.

use crate::identity::domain::{Email, OneTimeCode};
use crate::identity::ports::{NotifierError, OtpNotifier};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use minijinja::{Environment, context};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const LOGIN_CODE_TEMPLATE: &str = "login_code.txt";

const LOGIN_CODE_BODY: &str = "\
Your sign-in code is {{ code }}.

It expires at {{ expires_at }} and can be used once.
If you did not ask to sign in to {{ app_name }}, ignore this message.
";

/// Renders login-code messages and writes them to the log instead of
/// sending them. The body, which contains the code, is logged at `debug`.
pub struct LoggingOtpNotifier {
    templates: Environment<'static>,
    app_name: String,
}

impl LoggingOtpNotifier {
    /// Creates a notifier signing messages as `app_name`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Render`] if the message template does not
    /// compile.
    pub fn new(app_name: impl Into<String>) -> Result<Self, NotifierError> {
        let mut templates = Environment::new();
        templates
            .add_template(LOGIN_CODE_TEMPLATE, LOGIN_CODE_BODY)
            .map_err(|err| NotifierError::Render(err.to_string()))?;
        Ok(Self {
            templates,
            app_name: app_name.into(),
        })
    }

    /// Renders the message body for `code`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Render`] when rendering fails.
    pub fn render(
        &self,
        code: &OneTimeCode,
        expires_at: DateTime<Utc>,
    ) -> Result<String, NotifierError> {
        self.templates
            .get_template(LOGIN_CODE_TEMPLATE)
            .and_then(|template| {
                template.render(context! {
                    code => code.as_str(),
                    expires_at => expires_at.format("%Y-%m-%d %H:%M UTC").to_string(),
                    app_name => self.app_name.as_str(),
                })
            })
            .map_err(|err| NotifierError::Render(err.to_string()))
    }
}

#[async_trait]
impl OtpNotifier for LoggingOtpNotifier {
    async fn deliver(
        &self,
        email: &Email,
        code: &OneTimeCode,
        expires_at: DateTime<Utc>,
    ) -> Result<(), NotifierError> {
        let body = self.render(code, expires_at)?;
        info!(%email, "login code message prepared");
        debug!(%email, %body, "login code message body");
        Ok(())
    }
}

/// Keeps the latest code issued per email in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingOtpNotifier {
    codes: Arc<Mutex<HashMap<String, OneTimeCode>>>,
}

impl RecordingOtpNotifier {
    /// Creates an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the latest code delivered to `email`.
    #[must_use]
    pub fn latest_code(&self, email: &str) -> Option<String> {
        let key = email.trim().to_lowercase();
        self.codes
            .lock()
            .ok()
            .and_then(|codes| codes.get(&key).map(|code| code.as_str().to_owned()))
    }
}

#[async_trait]
impl OtpNotifier for RecordingOtpNotifier {
    async fn deliver(
        &self,
        email: &Email,
        code: &OneTimeCode,
        _expires_at: DateTime<Utc>,
    ) -> Result<(), NotifierError> {
        let mut codes = self
            .codes
            .lock()
            .map_err(|err| NotifierError::Delivery(err.to_string()))?;
        codes.insert(email.as_str().to_owned(), code.clone());
        Ok(())
    }
}
