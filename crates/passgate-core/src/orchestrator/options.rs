//! Per-chain outcome handling options.

/// What to flash after an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlashOption {
    /// Flash the outcome's own message, under the outcome's kind when it
    /// has one.
    FromOutcome,
    /// Flash a fixed message.
    Text(String),
    /// Flash under a fixed kind; the message falls back to the outcome's.
    Detail {
        kind: Option<String>,
        message: Option<String>,
    },
}

impl FlashOption {
    /// Resolve the `(kind, message)` pair to flash, if any.
    pub fn resolve<'a>(
        &'a self,
        default_kind: &'a str,
        outcome_kind: Option<&'a str>,
        outcome_message: Option<&'a str>,
    ) -> Option<(&'a str, &'a str)> {
        match self {
            FlashOption::FromOutcome => {
                outcome_message.map(|msg| (outcome_kind.unwrap_or(default_kind), msg))
            }
            FlashOption::Text(text) => Some((default_kind, text.as_str())),
            FlashOption::Detail { kind, message } => message
                .as_deref()
                .or(outcome_message)
                .map(|msg| (kind.as_deref().unwrap_or(default_kind), msg)),
        }
    }
}

impl From<&str> for FlashOption {
    fn from(text: &str) -> Self {
        FlashOption::Text(text.to_string())
    }
}

/// What to append to the session's message list after an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOption {
    /// Append the outcome's own message.
    FromOutcome,
    /// Append a fixed message.
    Text(String),
}

impl MessageOption {
    pub fn resolve<'a>(&'a self, outcome_message: Option<&'a str>) -> Option<&'a str> {
        match self {
            MessageOption::FromOutcome => outcome_message,
            MessageOption::Text(text) => Some(text),
        }
    }
}

impl From<&str> for MessageOption {
    fn from(text: &str) -> Self {
        MessageOption::Text(text.to_string())
    }
}

/// Options for one authentication chain.
#[derive(Debug, Clone)]
pub struct AuthenticateOptions {
    pub failure_flash: Option<FlashOption>,
    pub failure_message: Option<MessageOption>,
    pub failure_redirect: Option<String>,
    /// Surface exhaustion as [`AuthError::Unauthenticated`](crate::AuthError)
    /// instead of writing a response.
    pub fail_with_error: bool,
    pub success_flash: Option<FlashOption>,
    pub success_message: Option<MessageOption>,
    pub success_redirect: Option<String>,
    /// Redirect to the pending return-to URL, or here when there is none.
    pub success_return_to_or_redirect: Option<String>,
    /// Attach the user under this property instead of logging in.
    pub assign_property: Option<String>,
    /// Run the auth-info transform after login.
    pub auth_info: bool,
}

impl Default for AuthenticateOptions {
    fn default() -> Self {
        Self {
            failure_flash: None,
            failure_message: None,
            failure_redirect: None,
            fail_with_error: false,
            success_flash: None,
            success_message: None,
            success_redirect: None,
            success_return_to_or_redirect: None,
            assign_property: None,
            auth_info: true,
        }
    }
}

impl AuthenticateOptions {
    pub fn with_failure_flash(mut self, flash: impl Into<FlashOption>) -> Self {
        self.failure_flash = Some(flash.into());
        self
    }

    pub fn with_failure_message(mut self, message: impl Into<MessageOption>) -> Self {
        self.failure_message = Some(message.into());
        self
    }

    pub fn with_failure_redirect(mut self, url: impl Into<String>) -> Self {
        self.failure_redirect = Some(url.into());
        self
    }

    pub fn with_fail_with_error(mut self, fail_with_error: bool) -> Self {
        self.fail_with_error = fail_with_error;
        self
    }

    pub fn with_success_flash(mut self, flash: impl Into<FlashOption>) -> Self {
        self.success_flash = Some(flash.into());
        self
    }

    pub fn with_success_message(mut self, message: impl Into<MessageOption>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    pub fn with_success_redirect(mut self, url: impl Into<String>) -> Self {
        self.success_redirect = Some(url.into());
        self
    }

    pub fn with_success_return_to_or_redirect(mut self, url: impl Into<String>) -> Self {
        self.success_return_to_or_redirect = Some(url.into());
        self
    }

    pub fn with_assign_property(mut self, property: impl Into<String>) -> Self {
        self.assign_property = Some(property.into());
        self
    }

    pub fn with_auth_info(mut self, auth_info: bool) -> Self {
        self.auth_info = auth_info;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_from_outcome() {
        let flash = FlashOption::FromOutcome;
        assert_eq!(
            flash.resolve("error", Some("warning"), Some("Bad password")),
            Some(("warning", "Bad password"))
        );
        assert_eq!(
            flash.resolve("error", None, Some("Bad password")),
            Some(("error", "Bad password"))
        );
        assert_eq!(flash.resolve("error", None, None), None);
    }

    #[test]
    fn test_flash_text_ignores_outcome_kind() {
        let flash = FlashOption::from("Invalid login");
        assert_eq!(
            flash.resolve("error", Some("warning"), Some("Bad password")),
            Some(("error", "Invalid login"))
        );
    }

    #[test]
    fn test_flash_detail_falls_back_to_outcome_message() {
        let flash = FlashOption::Detail {
            kind: Some("notice".into()),
            message: None,
        };
        assert_eq!(
            flash.resolve("success", Some("info"), Some("Welcome")),
            Some(("notice", "Welcome"))
        );
    }

    #[test]
    fn test_message_option() {
        assert_eq!(MessageOption::FromOutcome.resolve(Some("x")), Some("x"));
        assert_eq!(MessageOption::from("fixed").resolve(Some("x")), Some("fixed"));
        assert_eq!(MessageOption::FromOutcome.resolve(None), None);
    }

    #[test]
    fn test_default_options() {
        let options = AuthenticateOptions::default();
        assert!(options.auth_info);
        assert!(!options.fail_with_error);
        assert!(options.assign_property.is_none());
    }
}
