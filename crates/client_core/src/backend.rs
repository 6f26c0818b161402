use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{Identity, ProblemNumber},
    error::ApiException,
    protocol::{
        ChatRequest, ChatResponse, LoginRequest, LoginResponse, SignupRequest, SubmitCodeRequest,
        SubmitCodeResponse, CHAT_PATH, LOGIN_PATH, SIGNUP_PATH, SUBMIT_CODE_PATH,
    },
};
use tracing::debug;

use crate::error::BackendError;

#[async_trait]
pub trait TutorBackend: Send + Sync {
    async fn chat(&self, message: &str, identity: &Identity) -> Result<String, BackendError>;

    async fn submit_code(
        &self,
        identity: &Identity,
        code: &str,
        problem: &ProblemNumber,
    ) -> Result<String, BackendError>;
}

#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, BackendError>;
    async fn signup(&self, request: &SignupRequest) -> Result<(), BackendError>;
}

pub struct MissingTutorBackend;

#[async_trait]
impl TutorBackend for MissingTutorBackend {
    async fn chat(&self, _message: &str, _identity: &Identity) -> Result<String, BackendError> {
        Err(BackendError::Unavailable("no tutor service configured".into()))
    }

    async fn submit_code(
        &self,
        _identity: &Identity,
        _code: &str,
        problem: &ProblemNumber,
    ) -> Result<String, BackendError> {
        Err(BackendError::Unavailable(format!(
            "no grading service configured for problem {problem}"
        )))
    }
}

pub struct MissingAuthBackend;

#[async_trait]
impl AuthBackend for MissingAuthBackend {
    async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse, BackendError> {
        Err(BackendError::Unavailable("no auth service configured".into()))
    }

    async fn signup(&self, _request: &SignupRequest) -> Result<(), BackendError> {
        Err(BackendError::Unavailable("no auth service configured".into()))
    }
}

#[derive(Clone)]
struct JsonTransport {
    http: Client,
    base_url: String,
}

impl JsonTransport {
    fn new(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    async fn send<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, BackendError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "posting to service");
        let response = self.http.post(url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiException::from_body(status.as_u16(), &body).into());
        }
        Ok(response)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, BackendError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let bytes = self.send(path, body).await?.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| BackendError::MalformedBody(err.to_string()))
    }
}

#[derive(Clone)]
pub struct HttpTutorBackend {
    transport: JsonTransport,
}

impl HttpTutorBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            transport: JsonTransport::new(http, base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.transport.base_url
    }
}

#[async_trait]
impl TutorBackend for HttpTutorBackend {
    async fn chat(&self, message: &str, identity: &Identity) -> Result<String, BackendError> {
        let body: ChatResponse = self
            .transport
            .post(
                CHAT_PATH,
                &ChatRequest {
                    message: message.to_string(),
                    user_id: identity.clone(),
                },
            )
            .await?;
        Ok(body.response)
    }

    async fn submit_code(
        &self,
        identity: &Identity,
        code: &str,
        problem: &ProblemNumber,
    ) -> Result<String, BackendError> {
        let body: SubmitCodeResponse = self
            .transport
            .post(
                SUBMIT_CODE_PATH,
                &SubmitCodeRequest {
                    user_id: identity.clone(),
                    code: code.to_string(),
                    problem_number: problem.clone(),
                },
            )
            .await?;
        Ok(body.message.unwrap_or_default())
    }
}

#[derive(Clone)]
pub struct HttpAuthBackend {
    transport: JsonTransport,
}

impl HttpAuthBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            transport: JsonTransport::new(http, base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.transport.base_url
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, BackendError> {
        self.transport.post(LOGIN_PATH, request).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<(), BackendError> {
        self.transport.send(SIGNUP_PATH, request).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
