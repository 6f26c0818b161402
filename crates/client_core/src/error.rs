use shared::error::ApiException;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service rejected request: {0}")]
    Status(#[from] ApiException),
    #[error("malformed response body: {0}")]
    MalformedBody(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(exception) => Some(exception.status),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

pub const LOGIN_FAILED_NOTICE: &str = "로그인에 실패했습니다.";
pub const SIGNUP_FAILED_NOTICE: &str = "회원가입에 실패했습니다.";
pub const PASSWORD_MISMATCH_NOTICE: &str = "비밀번호가 일치하지 않습니다.";
pub const STORAGE_FAILED_NOTICE: &str = "로그인 정보를 저장하지 못했습니다.";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password confirmation does not match")]
    PasswordMismatch,
    #[error("login rejected: {0}")]
    LoginRejected(#[source] BackendError),
    #[error("signup rejected: {0}")]
    SignupRejected(#[source] BackendError),
    #[error("failed to persist session: {0}")]
    Storage(#[from] anyhow::Error),
}

impl AuthError {
    pub fn notice(&self) -> &'static str {
        match self {
            Self::PasswordMismatch => PASSWORD_MISMATCH_NOTICE,
            Self::LoginRejected(_) => LOGIN_FAILED_NOTICE,
            Self::SignupRejected(_) => SIGNUP_FAILED_NOTICE,
            Self::Storage(_) => STORAGE_FAILED_NOTICE,
        }
    }
}
