use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{Identity, ProblemNumber};

pub const CHAT_PATH: &str = "/api/chat";
pub const SUBMIT_CODE_PATH: &str = "/api/submit-code";
pub const LOGIN_PATH: &str = "/api/users/login";
pub const SIGNUP_PATH: &str = "/api/users/signup";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub user_id: Identity,
}

/// The service also echoes `user_id`; only `response` is consumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Identity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitCodeRequest {
    pub user_id: Identity,
    pub code: String,
    pub problem_number: ProblemNumber,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitCodeResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub user_id: Option<Identity>,
}

/// The auth service may send `userId` as a JSON number.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<Identity>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(raw)) if !raw.is_empty() => Some(Identity(raw)),
        Some(serde_json::Value::Number(raw)) => Some(Identity(raw.to_string())),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}
