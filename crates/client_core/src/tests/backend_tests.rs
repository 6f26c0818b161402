use super::*;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    chats: Arc<Mutex<Vec<ChatRequest>>>,
    submissions: Arc<Mutex<Vec<SubmitCodeRequest>>>,
    signups: Arc<Mutex<Vec<SignupRequest>>>,
}

async fn handle_chat(
    State(state): State<ServerState>,
    Json(request): Json<ChatRequest>,
) -> Json<serde_json::Value> {
    let reply = format!("echo: {}", request.message);
    let user_id = request.user_id.clone();
    state.chats.lock().await.push(request);
    Json(serde_json::json!({ "response": reply, "user_id": user_id }))
}

async fn handle_submit(
    State(state): State<ServerState>,
    Json(request): Json<SubmitCodeRequest>,
) -> Json<serde_json::Value> {
    state.submissions.lock().await.push(request);
    Json(serde_json::json!({ "message": "수정이 필요하지 않음" }))
}

async fn handle_login(Json(request): Json<LoginRequest>) -> (StatusCode, Json<serde_json::Value>) {
    if request.password == "secret" && request.remember_me {
        (
            StatusCode::OK,
            Json(serde_json::json!({ "token": "NO_TOKEN", "name": "김파이", "userId": 7 })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "message": "bad credentials" })),
        )
    }
}

async fn handle_signup(
    State(state): State<ServerState>,
    Json(request): Json<SignupRequest>,
) -> StatusCode {
    state.signups.lock().await.push(request);
    StatusCode::CREATED
}

async fn spawn_services() -> anyhow::Result<(String, ServerState)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/chat", post(handle_chat))
        .route("/api/submit-code", post(handle_submit))
        .route("/api/users/login", post(handle_login))
        .route("/api/users/signup", post(handle_signup))
        .route(
            "/broken/api/chat",
            post(|| async { (StatusCode::OK, "<html>not json</html>") }),
        )
        .route(
            "/failing/api/submit-code",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": "user_id required" })),
                )
            }),
        )
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

#[tokio::test]
async fn chat_posts_message_with_identity_and_returns_response_field() {
    let (base_url, state) = spawn_services().await.expect("server");
    let backend = HttpTutorBackend::new(format!("{base_url}/"));

    let reply = backend
        .chat("리스트 자료형 이론", &Identity::from("1700000000000"))
        .await
        .expect("chat");

    assert_eq!(reply, "echo: 리스트 자료형 이론");
    let chats = state.chats.lock().await;
    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0].user_id, Identity::from("1700000000000"));
}

#[tokio::test]
async fn submit_code_sends_problem_number_and_returns_message() {
    let (base_url, state) = spawn_services().await.expect("server");
    let backend = HttpTutorBackend::new(base_url);

    let message = backend
        .submit_code(
            &Identity::from("42"),
            "print('hi')",
            &ProblemNumber::from("002"),
        )
        .await
        .expect("submit");

    assert_eq!(message, "수정이 필요하지 않음");
    let submissions = state.submissions.lock().await;
    assert_eq!(submissions[0].problem_number, ProblemNumber::from("002"));
    assert_eq!(submissions[0].code, "print('hi')");
}

#[tokio::test]
async fn non_json_body_is_reported_as_malformed() {
    let (base_url, _state) = spawn_services().await.expect("server");
    let backend = HttpTutorBackend::new(format!("{base_url}/broken"));

    let err = backend
        .chat("hello", &Identity::from("1"))
        .await
        .expect_err("malformed body");
    assert!(matches!(err, BackendError::MalformedBody(_)), "{err}");
}

#[tokio::test]
async fn error_status_carries_server_detail() {
    let (base_url, _state) = spawn_services().await.expect("server");
    let backend = HttpTutorBackend::new(format!("{base_url}/failing"));

    let err = backend
        .submit_code(&Identity::from("1"), "x", &ProblemNumber::default())
        .await
        .expect_err("400");
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("user_id required"), "{err}");
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let backend = HttpTutorBackend::new(format!("http://{addr}"));
    let err = backend
        .chat("hello", &Identity::from("1"))
        .await
        .expect_err("connection refused");
    assert!(matches!(err, BackendError::Transport(_)), "{err}");
}

#[tokio::test]
async fn login_parses_numeric_user_id_and_rejects_bad_password() {
    let (base_url, _state) = spawn_services().await.expect("server");
    let backend = HttpAuthBackend::new(base_url);

    let accepted = backend
        .login(&LoginRequest {
            email: "kim@example.com".into(),
            password: "secret".into(),
            remember_me: true,
        })
        .await
        .expect("login");
    assert_eq!(accepted.name, "김파이");
    assert_eq!(accepted.user_id, Some(Identity::from("7")));

    let rejected = backend
        .login(&LoginRequest {
            email: "kim@example.com".into(),
            password: "wrong".into(),
            remember_me: true,
        })
        .await
        .expect_err("401");
    assert_eq!(rejected.status(), Some(401));
}

#[tokio::test]
async fn signup_succeeds_on_any_2xx() {
    let (base_url, state) = spawn_services().await.expect("server");
    let backend = HttpAuthBackend::new(base_url);

    backend
        .signup(&SignupRequest {
            name: "김파이".into(),
            email: "kim@example.com".into(),
            password: "secret".into(),
        })
        .await
        .expect("signup");
    assert_eq!(state.signups.lock().await.len(), 1);
}

#[tokio::test]
async fn missing_backends_always_fail() {
    let err = MissingTutorBackend
        .chat("hello", &Identity::from("1"))
        .await
        .expect_err("unavailable");
    assert!(matches!(err, BackendError::Unavailable(_)));

    let err = MissingAuthBackend
        .signup(&SignupRequest {
            name: "n".into(),
            email: "e".into(),
            password: "p".into(),
        })
        .await
        .expect_err("unavailable");
    assert!(matches!(err, BackendError::Unavailable(_)));
}
