//! Advisor orchestration
//!
//! Sequences the remote provider, the response validator and the heuristic fallback
//! for one query at a time.
//!
//! Failure policy: credential, transport, upstream-status and deadline failures end the
//! submission in [`AdvisorState::Failed`] and are surfaced to the caller. Only a
//! successful call whose output yields no usable recommendations (absent text,
//! malformed JSON, empty or fully invalid list) falls back to heuristic scoring.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, PoisonError, RwLock, RwLockWriteGuard,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::{
    error::AppError,
    models::{AdvisorResponse, Catalog, MAX_RECOMMENDATIONS},
    services::{
        heuristic,
        providers::{AdvisorProvider, RemoteCompletion},
        validator::{self, ValidationError},
    },
};

/// Provenance label used when neither the service nor the provider names a model
pub const DEFAULT_MODEL_LABEL: &str = "remote-advisor";

const DEFAULT_DEADLINE: Duration = Duration::from_secs(20);

/// Lifecycle of the most recent submission
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdvisorState {
    Idle,
    Requesting,
    Succeeded,
    FallbackApplied,
    Failed,
}

/// Why heuristic scoring replaced the remote answer
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The envelope carried no text part
    NoRawText,
    /// The text was not JSON or lacked a recommendations array
    MalformedResponse,
    /// The list was empty or every entry was invalid
    NoUsableRecommendations,
}

impl From<&ValidationError> for FallbackReason {
    fn from(err: &ValidationError) -> Self {
        match err {
            ValidationError::MissingText => FallbackReason::NoRawText,
            ValidationError::Malformed(_) | ValidationError::MissingRecommendations => {
                FallbackReason::MalformedResponse
            }
        }
    }
}

/// Why a submission was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyQuery,
    Busy,
}

/// Result of [`Advisor::submit`]
#[derive(Debug)]
pub enum Submission {
    /// The submission was a no-op; advisor state is unchanged
    Ignored(IgnoreReason),
    /// The remote model produced usable recommendations
    Succeeded(AdvisorResponse),
    /// Heuristic scoring replaced an unusable remote answer
    FallbackApplied {
        response: AdvisorResponse,
        reason: FallbackReason,
    },
    /// The remote call failed; no fallback was attempted
    Failed(AppError),
}

/// Observable advisor state for the presentation layer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorSnapshot {
    pub state: AdvisorState,
    pub loading: bool,
    /// Query of the latest accepted submission
    pub query: Option<String>,
    /// Latest resolved response; kept when a later submission fails
    pub response: Option<AdvisorResponse>,
    pub error: Option<String>,
    pub fallback_reason: Option<FallbackReason>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Default for AdvisorSnapshot {
    fn default() -> Self {
        Self {
            state: AdvisorState::Idle,
            loading: false,
            query: None,
            response: None,
            error: None,
            fallback_reason: None,
            completed_at: None,
        }
    }
}

const CANCELLED_MESSAGE: &str = "Recommendation request was cancelled before completing";

/// Holds the busy flag for one submission
///
/// Dropping an unsettled guard (the `submit` future was cancelled) records a failed
/// outcome so the snapshot never stays in `Requesting` after the flag is released.
struct InFlight<'a> {
    advisor: &'a Advisor,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, submission: &Submission) {
        self.advisor.record(submission);
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("Recommendation request cancelled");
            self.advisor.record_cancelled();
        }
        self.advisor.busy.store(false, Ordering::Release);
    }
}

/// Single entry point used by the presentation layer
pub struct Advisor {
    provider: Arc<dyn AdvisorProvider>,
    catalog: Catalog,
    deadline: Duration,
    busy: AtomicBool,
    snapshot: RwLock<AdvisorSnapshot>,
}

impl Advisor {
    pub fn new(provider: Arc<dyn AdvisorProvider>, catalog: Catalog) -> Self {
        Self {
            provider,
            catalog,
            deadline: DEFAULT_DEADLINE,
            busy: AtomicBool::new(false),
            snapshot: RwLock::new(AdvisorSnapshot::default()),
        }
    }

    /// Sets the deadline applied to each remote call
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// True while a submission is in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Current observable state
    pub fn snapshot(&self) -> AdvisorSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn snapshot_mut(&self) -> RwLockWriteGuard<'_, AdvisorSnapshot> {
        self.snapshot.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolves recommendations for `query`.
    ///
    /// Blank queries and submissions made while another is in flight are ignored.
    pub async fn submit(&self, query: &str) -> Submission {
        let query = query.trim();
        if query.is_empty() {
            tracing::debug!("Ignoring empty query");
            return Submission::Ignored(IgnoreReason::EmptyQuery);
        }

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(query = %query, "Ignoring submission while a request is in flight");
            return Submission::Ignored(IgnoreReason::Busy);
        }
        let in_flight = InFlight {
            advisor: self,
            settled: false,
        };

        {
            let mut snapshot = self.snapshot_mut();
            snapshot.state = AdvisorState::Requesting;
            snapshot.loading = true;
            snapshot.query = Some(query.to_string());
            snapshot.error = None;
            snapshot.fallback_reason = None;
        }

        tracing::info!(
            query = %query,
            provider = self.provider.name(),
            "Requesting recommendations"
        );

        let submission = match self.request(query).await {
            Ok(completion) => self.resolve(query, completion),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    provider = self.provider.name(),
                    "Recommendation request failed"
                );
                Submission::Failed(e)
            }
        };

        in_flight.settle(&submission);
        submission
    }

    async fn request(&self, query: &str) -> Result<RemoteCompletion, AppError> {
        tokio::time::timeout(
            self.deadline,
            self.provider.request_recommendations(query, &self.catalog),
        )
        .await
        .map_err(|_| AppError::Timeout(self.deadline))?
    }

    fn resolve(&self, query: &str, completion: RemoteCompletion) -> Submission {
        let provider_label = non_empty(self.provider.model_label())
            .unwrap_or_else(|| DEFAULT_MODEL_LABEL.to_string());

        let fallback_reason = match validator::validate(completion.text.as_deref()) {
            Ok(mut recommendations) if !recommendations.is_empty() => {
                if recommendations.len() > MAX_RECOMMENDATIONS {
                    tracing::debug!(
                        returned = recommendations.len(),
                        "Truncating remote recommendations"
                    );
                    recommendations.truncate(MAX_RECOMMENDATIONS);
                }

                let model = completion
                    .model
                    .and_then(non_empty)
                    .unwrap_or(provider_label);

                tracing::info!(
                    model = %model,
                    recommendations = recommendations.len(),
                    "Remote recommendations accepted"
                );

                return Submission::Succeeded(AdvisorResponse {
                    recommendations,
                    model: Some(model),
                    raw_text: completion.text,
                });
            }
            Ok(_) => FallbackReason::NoUsableRecommendations,
            Err(e) => {
                tracing::debug!(error = %e, "Remote output unusable");
                FallbackReason::from(&e)
            }
        };

        let recommendations = heuristic::score(query, self.catalog.products());

        tracing::warn!(
            reason = ?fallback_reason,
            recommendations = recommendations.len(),
            "Applied heuristic fallback"
        );

        Submission::FallbackApplied {
            response: AdvisorResponse {
                recommendations,
                model: Some(format!("heuristic (fallback from {})", provider_label)),
                raw_text: completion.text,
            },
            reason: fallback_reason,
        }
    }

    fn record(&self, submission: &Submission) {
        let mut snapshot = self.snapshot_mut();
        snapshot.loading = false;
        snapshot.completed_at = Some(Utc::now());

        match submission {
            Submission::Succeeded(response) => {
                snapshot.state = AdvisorState::Succeeded;
                snapshot.response = Some(response.clone());
            }
            Submission::FallbackApplied { response, reason } => {
                snapshot.state = AdvisorState::FallbackApplied;
                snapshot.response = Some(response.clone());
                snapshot.fallback_reason = Some(*reason);
            }
            Submission::Failed(e) => {
                snapshot.state = AdvisorState::Failed;
                snapshot.error = Some(e.to_string());
            }
            Submission::Ignored(_) => {}
        }
    }

    fn record_cancelled(&self) {
        let mut snapshot = self.snapshot_mut();
        snapshot.state = AdvisorState::Failed;
        snapshot.loading = false;
        snapshot.error = Some(CANCELLED_MESSAGE.to_string());
        snapshot.completed_at = Some(Utc::now());
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
