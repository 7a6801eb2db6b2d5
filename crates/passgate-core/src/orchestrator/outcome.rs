//! Chain outcomes and how they resolve.

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::Response;

use crate::context::AuthContext;
use crate::error::AuthError;
use crate::strategy::{AuthInfo, AuthUser, Challenge, FailureRecord};

/// Failures collected by a chain that ran out of strategies.
///
/// A single-strategy chain reports its one record; a multi-strategy chain
/// reports every record in chain order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReport {
    Single(FailureRecord),
    Multi(Vec<FailureRecord>),
}

impl FailureReport {
    pub fn records(&self) -> &[FailureRecord] {
        match self {
            FailureReport::Single(record) => std::slice::from_ref(record),
            FailureReport::Multi(records) => records,
        }
    }

    /// Challenges in chain order.
    pub fn challenges(&self) -> Vec<Option<&Challenge>> {
        self.records().iter().map(|r| r.challenge.as_ref()).collect()
    }

    /// Statuses in chain order.
    pub fn statuses(&self) -> Vec<Option<StatusCode>> {
        self.records().iter().map(|r| r.status).collect()
    }

    /// The first explicit status, or 401.
    pub fn status(&self) -> StatusCode {
        self.records()
            .iter()
            .find_map(|r| r.status)
            .unwrap_or(StatusCode::UNAUTHORIZED)
    }
}

/// What a chain decided, as handed to a [`ResultHandler`].
#[derive(Debug)]
pub enum Outcome<U> {
    Authenticated { user: U, info: Option<AuthInfo> },
    Failed(FailureReport),
    Errored(AuthError),
}

/// How the middleware proceeds after a chain ran.
#[derive(Debug)]
pub enum Resolution {
    /// Hand the request to the next handler.
    Continue,
    /// Write this response and stop.
    Respond(Response),
    /// Abort with an error.
    Fatal(AuthError),
}

impl Resolution {
    pub fn is_continue(&self) -> bool {
        matches!(self, Resolution::Continue)
    }
}

/// Application callback that takes over outcome handling.
///
/// When a chain has a handler, success, exhaustion, and errors are all
/// delivered here and none of the built-in login, flash, redirect, or
/// response behavior runs.
#[async_trait]
pub trait ResultHandler<U: AuthUser>: Send + Sync {
    async fn handle(&self, cx: &AuthContext<U>, outcome: Outcome<U>) -> Resolution;
}
