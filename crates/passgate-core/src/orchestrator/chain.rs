//! Running a chain of strategies against one request.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use super::options::{AuthenticateOptions, FlashOption, MessageOption};
use super::outcome::{FailureReport, Outcome, Resolution, ResultHandler};
use super::{Authenticator, StrategyChain};
use crate::context::AuthContext;
use crate::error::{AuthError, AuthResult};
use crate::strategy::{Action, AuthInfo, AuthUser, Challenge, FailureRecord};

/// An ordered list of strategies plus the policy applied to their outcome.
///
/// Strategies run one at a time in chain order. A `Fail` moves on to the
/// next strategy; any other action settles the chain. When every strategy
/// failed, the failure policy in [`AuthenticateOptions`] decides the
/// response.
pub struct AuthChain<U: AuthUser> {
    authenticator: Arc<Authenticator<U>>,
    chain: StrategyChain,
    options: AuthenticateOptions,
    callback: Option<Arc<dyn ResultHandler<U>>>,
}

impl<U: AuthUser> AuthChain<U> {
    pub(crate) fn new(
        authenticator: Arc<Authenticator<U>>,
        chain: StrategyChain,
        options: AuthenticateOptions,
    ) -> Self {
        Self {
            authenticator,
            chain,
            options,
            callback: None,
        }
    }

    /// Hand every outcome to `handler` instead of the built-in policy.
    pub fn with_callback(mut self, handler: impl ResultHandler<U> + 'static) -> Self {
        self.callback = Some(Arc::new(handler));
        self
    }

    pub fn names(&self) -> &[String] {
        self.chain.names()
    }

    pub fn options(&self) -> &AuthenticateOptions {
        &self.options
    }

    pub fn authenticator(&self) -> &Arc<Authenticator<U>> {
        &self.authenticator
    }

    /// Run the chain for one request.
    pub async fn run(&self, cx: &AuthContext<U>) -> Resolution {
        let mut failures = Vec::new();

        for name in self.chain.names() {
            let Some(strategy) = self.authenticator.strategy(name) else {
                return Resolution::Fatal(AuthError::UnknownStrategy(name.clone()));
            };

            let action = strategy.authenticate(cx, &self.options).await;
            debug!(strategy = %name, action = action.label(), "strategy decided");

            match action {
                Action::Fail(record) => failures.push(record),
                Action::Success { user, info } => return self.succeed(cx, user, info).await,
                Action::Redirect { url, status } => return redirect(&url, status),
                Action::Pass => return Resolution::Continue,
                Action::Error(err) => return self.errored(cx, err).await,
            }
        }

        self.all_failed(cx, failures).await
    }

    async fn succeed(&self, cx: &AuthContext<U>, user: U, info: Option<AuthInfo>) -> Resolution {
        if let Some(handler) = &self.callback {
            return handler
                .handle(cx, Outcome::Authenticated { user, info })
                .await;
        }

        let kind = info.as_ref().and_then(AuthInfo::kind);
        let message = info.as_ref().and_then(AuthInfo::message);
        if let Err(err) = record_messages(
            cx,
            self.options.success_flash.as_ref(),
            self.options.success_message.as_ref(),
            "success",
            kind,
            message,
        ) {
            return Resolution::Fatal(err);
        }

        if let Some(property) = &self.options.assign_property {
            debug!(user_id = %user.id(), property = %property, "assigning authenticated user");
            cx.assign(property.clone(), user);
            return Resolution::Continue;
        }

        if let Err(err) = cx.log_in(user).await {
            return Resolution::Fatal(err);
        }

        if self.options.auth_info {
            match self.authenticator.info_transform().transform(cx, info).await {
                Ok(info) => cx.set_auth_info(info),
                Err(err) => return Resolution::Fatal(err),
            }
        }

        if let Some(fallback) = &self.options.success_return_to_or_redirect {
            let target = cx
                .messages()
                .and_then(|sink| sink.take_return_to())
                .unwrap_or_else(|| fallback.clone());
            return redirect(&target, StatusCode::FOUND);
        }
        if let Some(url) = &self.options.success_redirect {
            return redirect(url, StatusCode::FOUND);
        }
        Resolution::Continue
    }

    async fn errored(&self, cx: &AuthContext<U>, err: AuthError) -> Resolution {
        match &self.callback {
            Some(handler) => handler.handle(cx, Outcome::Errored(err)).await,
            None => Resolution::Fatal(err),
        }
    }

    async fn all_failed(&self, cx: &AuthContext<U>, failures: Vec<FailureRecord>) -> Resolution {
        let report = if self.chain.is_multi() {
            FailureReport::Multi(failures)
        } else {
            FailureReport::Single(failures.into_iter().next().unwrap_or_default())
        };

        if let Some(handler) = &self.callback {
            return handler.handle(cx, Outcome::Failed(report)).await;
        }

        // The first strategy's challenge is the one shown to the user.
        let first = report.records().first().and_then(|r| r.challenge.as_ref());
        if let Err(err) = record_messages(
            cx,
            self.options.failure_flash.as_ref(),
            self.options.failure_message.as_ref(),
            "error",
            first.and_then(Challenge::kind),
            first.and_then(Challenge::message),
        ) {
            return Resolution::Fatal(err);
        }

        if let Some(url) = &self.options.failure_redirect {
            return redirect(url, StatusCode::FOUND);
        }

        let status = report.status();
        let challenges = if status == StatusCode::UNAUTHORIZED {
            report
                .records()
                .iter()
                .filter_map(|r| r.challenge.as_ref().and_then(Challenge::as_text))
                .map(str::to_string)
                .collect()
        } else {
            Vec::new()
        };
        debug!(status = status.as_u16(), "authentication chain exhausted");

        let err = AuthError::Unauthenticated { status, challenges };
        if self.options.fail_with_error {
            Resolution::Fatal(err)
        } else {
            Resolution::Respond(err.into_response())
        }
    }
}

fn record_messages<U: AuthUser>(
    cx: &AuthContext<U>,
    flash: Option<&FlashOption>,
    message: Option<&MessageOption>,
    default_kind: &str,
    outcome_kind: Option<&str>,
    outcome_message: Option<&str>,
) -> AuthResult<()> {
    if flash.is_none() && message.is_none() {
        return Ok(());
    }
    let sink = cx.messages().ok_or_else(|| {
        AuthError::Config("flash and session messages require a message sink".to_string())
    })?;

    if let Some((kind, text)) =
        flash.and_then(|flash| flash.resolve(default_kind, outcome_kind, outcome_message))
    {
        sink.flash(kind, text);
    }
    if let Some(text) = message.and_then(|message| message.resolve(outcome_message)) {
        sink.push_message(text.to_string());
    }
    Ok(())
}

fn redirect(url: &str, status: StatusCode) -> Resolution {
    let Ok(location) = HeaderValue::from_str(url) else {
        return Resolution::Fatal(AuthError::Config(format!(
            "invalid redirect location \"{url}\""
        )));
    };

    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response.headers_mut().insert(header::LOCATION, location);
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
    Resolution::Respond(response)
}
