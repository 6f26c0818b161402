use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::{
    domain::{Identity, ProblemNumber},
    protocol::{LoginRequest, LoginResponse, SignupRequest},
};
use storage::Storage;
use tokio::sync::{Mutex, Notify};

use crate::{
    backend::{AuthBackend, TutorBackend},
    error::BackendError,
    session::{LogoutPolicy, Session},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedChat {
    pub message: String,
    pub identity: Identity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSubmission {
    pub identity: Identity,
    pub code: String,
    pub problem: ProblemNumber,
}

/// Replies are `Some(text)` for success or `None` for a transport failure.
pub struct FakeTutorBackend {
    pub chat_reply: Option<String>,
    pub grading_reply: Option<String>,
    pub delay: Duration,
    pub gate: Option<Arc<Notify>>,
    pub chats: Mutex<Vec<RecordedChat>>,
    pub submissions: Mutex<Vec<RecordedSubmission>>,
}

impl FakeTutorBackend {
    pub fn replying(chat_reply: &str, grading_reply: &str) -> Self {
        Self {
            chat_reply: Some(chat_reply.to_string()),
            grading_reply: Some(grading_reply.to_string()),
            delay: Duration::ZERO,
            gate: None,
            chats: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            chat_reply: None,
            grading_reply: None,
            ..Self::replying("", "")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Requests wait for `gate.notify_one()` before replying.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    async fn wait_turn(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl TutorBackend for FakeTutorBackend {
    async fn chat(&self, message: &str, identity: &Identity) -> Result<String, BackendError> {
        self.chats.lock().await.push(RecordedChat {
            message: message.to_string(),
            identity: identity.clone(),
        });
        self.wait_turn().await;
        self.chat_reply
            .clone()
            .ok_or_else(|| BackendError::Unavailable("connection refused".into()))
    }

    async fn submit_code(
        &self,
        identity: &Identity,
        code: &str,
        problem: &ProblemNumber,
    ) -> Result<String, BackendError> {
        self.submissions.lock().await.push(RecordedSubmission {
            identity: identity.clone(),
            code: code.to_string(),
            problem: problem.clone(),
        });
        self.wait_turn().await;
        self.grading_reply
            .clone()
            .ok_or_else(|| BackendError::MalformedBody("expected value at line 1".into()))
    }
}

pub struct FakeAuthBackend {
    pub login_reply: Option<LoginResponse>,
    pub signup_ok: bool,
    pub logins: Mutex<Vec<LoginRequest>>,
    pub signups: Mutex<Vec<SignupRequest>>,
}

impl FakeAuthBackend {
    pub fn accepting(name: &str, user_id: Option<&str>) -> Self {
        Self {
            login_reply: Some(LoginResponse {
                token: "NO_TOKEN".into(),
                name: name.to_string(),
                user_id: user_id.map(Identity::from),
            }),
            signup_ok: true,
            logins: Mutex::new(Vec::new()),
            signups: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            login_reply: None,
            signup_ok: false,
            logins: Mutex::new(Vec::new()),
            signups: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AuthBackend for FakeAuthBackend {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, BackendError> {
        self.logins.lock().await.push(request.clone());
        self.login_reply.clone().ok_or_else(|| {
            BackendError::Status(shared::error::ApiException::new(401, "bad credentials"))
        })
    }

    async fn signup(&self, request: &SignupRequest) -> Result<(), BackendError> {
        self.signups.lock().await.push(request.clone());
        if self.signup_ok {
            Ok(())
        } else {
            Err(BackendError::Status(shared::error::ApiException::new(
                409,
                "email already registered",
            )))
        }
    }
}

pub async fn memory_session() -> Arc<Session> {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    Arc::new(
        Session::open(storage, LogoutPolicy::KeepIdentity)
            .await
            .expect("session"),
    )
}

/// Opens storage on the real clock, then pauses time for the rest of the test.
pub async fn paused_session() -> Arc<Session> {
    let session = memory_session().await;
    tokio::time::pause();
    session
}
