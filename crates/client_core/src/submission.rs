use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::domain::{ProblemNumber, Verdict};
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::{
    backend::TutorBackend,
    error::BackendError,
    feedback::{code_fragments, parse_feedback, CopyButton, FeedbackBlock},
    session::Session,
    TutorEvent,
};

pub const NO_CORRECTION_SENTINEL: &str = "수정이 필요하지 않음";
pub const CORRECT_MESSAGE: &str = "정답입니다!";
pub const GRADING_FAILURE_MESSAGE: &str = "오류가 발생했습니다. 다시 시도해주세요.";
pub const GRADING_OVERLAY_MESSAGE: &str = "채점 중...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub verdict: Verdict,
    pub raw_message: String,
}

impl SubmissionResult {
    pub fn is_correct(&self) -> bool {
        self.verdict == Verdict::Correct
    }

    pub fn blocks(&self) -> Vec<FeedbackBlock> {
        match self.verdict {
            Verdict::Correct => vec![FeedbackBlock::Paragraph(self.raw_message.clone())],
            Verdict::Incorrect | Verdict::TransportError => parse_feedback(&self.raw_message),
        }
    }

    pub fn copy_buttons(&self, revert_after: Duration) -> Vec<CopyButton> {
        code_fragments(&self.blocks())
            .map(|code| CopyButton::new(code, revert_after))
            .collect()
    }
}

pub fn classify(outcome: Result<String, BackendError>) -> SubmissionResult {
    match outcome {
        Ok(message) if message.contains(NO_CORRECTION_SENTINEL) => SubmissionResult {
            verdict: Verdict::Correct,
            raw_message: CORRECT_MESSAGE.to_string(),
        },
        Ok(message) => SubmissionResult {
            verdict: Verdict::Incorrect,
            raw_message: message,
        },
        Err(err) => {
            warn!(error = %err, "grading request failed");
            SubmissionResult {
                verdict: Verdict::TransportError,
                raw_message: GRADING_FAILURE_MESSAGE.to_string(),
            }
        }
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct SubmissionController {
    backend: Arc<dyn TutorBackend>,
    session: Arc<Session>,
    events: broadcast::Sender<TutorEvent>,
    in_flight: AtomicBool,
    problem: RwLock<ProblemNumber>,
    result: Mutex<Option<SubmissionResult>>,
}

impl SubmissionController {
    pub fn new(
        backend: Arc<dyn TutorBackend>,
        session: Arc<Session>,
        events: broadcast::Sender<TutorEvent>,
    ) -> Arc<Self> {
        Arc::new(Self {
            backend,
            session,
            events,
            in_flight: AtomicBool::new(false),
            problem: RwLock::new(ProblemNumber::default()),
            result: Mutex::new(None),
        })
    }

    pub async fn select_problem(&self, problem: ProblemNumber) {
        debug!(problem = %problem, "problem selected");
        *self.problem.write().await = problem;
    }

    pub async fn problem(&self) -> ProblemNumber {
        self.problem.read().await.clone()
    }

    pub async fn submit_code(self: &Arc<Self>, code: &str) -> Option<Verdict> {
        let problem = self.problem().await;
        self.submit_code_for(code, problem).await
    }

    pub async fn submit_code_for(
        self: &Arc<Self>,
        code: &str,
        problem: ProblemNumber,
    ) -> Option<Verdict> {
        if code.trim().is_empty() {
            debug!("ignoring blank code submission");
            return None;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("submission rejected while grading is in flight");
            return None;
        }
        let _ = self.events.send(TutorEvent::SubmissionStarted {
            problem: problem.clone(),
        });

        let controller = Arc::clone(self);
        let code = code.to_string();
        let request = tokio::spawn(async move {
            let in_flight = InFlightGuard(&controller.in_flight);
            let identity = controller.session.identity().await;
            info!(problem = %problem, identity = %identity, "submitting code for grading");
            let outcome = controller
                .backend
                .submit_code(&identity, &code, &problem)
                .await;

            let result = classify(outcome);
            let verdict = result.verdict;
            *controller.result.lock().await = Some(result);
            drop(in_flight);

            info!(problem = %problem, ?verdict, "grading finished");
            let _ = controller
                .events
                .send(TutorEvent::SubmissionFinished { verdict });
            verdict
        });

        match request.await {
            Ok(verdict) => Some(verdict),
            Err(err) => {
                error!(error = %err, "grading task failed");
                None
            }
        }
    }

    pub async fn result(&self) -> Option<SubmissionResult> {
        self.result.lock().await.clone()
    }

    pub async fn dismiss(&self) {
        self.result.lock().await.take();
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
