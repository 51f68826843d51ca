use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::engine::{EngineError, ReasoningEngine};
use crate::models::Digest;
use crate::prompt::build_prompt;
use crate::report::{self, AccessInfo};
use crate::scope::{AccessScope, ScopedView};
use crate::store::RecordStore;
use crate::summarize::{summarize, DigestLimits};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("reasoning engine unavailable: {0}")]
    EngineUnavailable(#[source] EngineError),

    #[error("reasoning engine returned an unusable response: {0}")]
    MalformedResponse(#[source] EngineError),

    #[error("reasoning engine did not answer within {0:?}")]
    Timeout(Duration),
}

impl QueryError {
    /// Whether asking again can succeed without fixing the credentials.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::EngineUnavailable(EngineError::Auth { .. }) => false,
            Self::EngineUnavailable(_) | Self::MalformedResponse(_) | Self::Timeout(_) => true,
        }
    }

    /// Message suitable for showing to the administrator as-is.
    pub fn user_message(&self) -> String {
        format!("Error processing query: {self}\n\nPlease try rephrasing your question.")
    }
}

impl From<EngineError> for QueryError {
    fn from(err: EngineError) -> Self {
        if err.is_malformed() {
            Self::MalformedResponse(err)
        } else {
            Self::EngineUnavailable(err)
        }
    }
}

/// Stateless bridge between a digest and the reasoning engine.
#[derive(Clone)]
pub struct QueryOrchestrator {
    engine: Arc<dyn ReasoningEngine>,
    timeout: Duration,
}

impl QueryOrchestrator {
    pub fn new(engine: Arc<dyn ReasoningEngine>) -> Self {
        Self {
            engine,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends one prompt and returns the engine's answer verbatim. No retries.
    pub async fn answer(&self, question: &str, digest: &Digest) -> Result<String, QueryError> {
        let prompt = build_prompt(question, digest);
        info!(
            engine = self.engine.name(),
            students = digest.student_count,
            prompt_chars = prompt.len(),
            "querying reasoning engine"
        );

        match tokio::time::timeout(self.timeout, self.engine.generate(&prompt)).await {
            Ok(Ok(answer)) => Ok(answer),
            Ok(Err(err)) => {
                warn!(category = err.category(), error = %err, "reasoning engine call failed");
                Err(err.into())
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "reasoning engine call timed out");
                Err(QueryError::Timeout(self.timeout))
            }
        }
    }
}

/// One administrator's session. The scope is fixed at construction; a
/// different scope needs a new session.
pub struct AdminSession<'a> {
    view: ScopedView<'a>,
    limits: DigestLimits,
    orchestrator: QueryOrchestrator,
}

impl<'a> AdminSession<'a> {
    pub fn new(
        store: &'a RecordStore,
        scope: AccessScope,
        limits: DigestLimits,
        orchestrator: QueryOrchestrator,
    ) -> Self {
        let view = ScopedView::new(store, scope);
        info!(
            grade = %view.scope().grade_label(),
            class = %view.scope().class_label(),
            records = view.len(),
            "admin session opened"
        );
        Self {
            view,
            limits,
            orchestrator,
        }
    }

    #[cfg(test)]
    pub fn view(&self) -> &ScopedView<'a> {
        &self.view
    }

    pub fn access_info(&self) -> AccessInfo {
        report::access_info(&self.view)
    }

    pub fn summary_report(&self) -> String {
        report::build_summary_report(&self.view)
    }

    /// Re-summarizes the view and asks the engine. Nothing is cached.
    pub async fn ask(&self, question: &str) -> Result<String, QueryError> {
        let digest = summarize(&self.view, &self.limits);
        self.orchestrator.answer(question, &digest).await
    }
}
