use super::*;
use crate::{
    conversation::CHAT_FAILURE_MESSAGE,
    tests_support::{memory_session, FakeAuthBackend, FakeTutorBackend},
};
use storage::keys;

fn client(auth: FakeAuthBackend, session: Arc<Session>) -> Arc<TutorClient> {
    TutorClient::new(
        TutorSettings::default(),
        session,
        Arc::new(FakeTutorBackend::replying("답변", "수정이 필요하지 않음")),
        Arc::new(auth),
    )
}

fn session_events(rx: &mut broadcast::Receiver<TutorEvent>) -> Vec<bool> {
    let mut changes = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let TutorEvent::SessionChanged { signed_in } = event {
            changes.push(signed_in);
        }
    }
    changes
}

#[test]
fn default_settings_match_interface_timings() {
    let settings = TutorSettings::default();
    assert_eq!(settings.reveal_interval, Duration::from_millis(50));
    assert_eq!(settings.copy_revert, Duration::from_secs(2));
    assert_eq!(settings.logout_policy, LogoutPolicy::KeepIdentity);
    assert_eq!(
        settings.timer(),
        TimerSettings {
            grace: Duration::from_millis(500),
            tick: Duration::from_millis(100),
        }
    );
}

#[tokio::test]
async fn login_and_logout_publish_session_changes() {
    let client = client(
        FakeAuthBackend::accepting("김파이", Some("42")),
        memory_session().await,
    );
    let mut rx = client.subscribe_events();

    let user = client
        .login("kim@example.com", "secret", false)
        .await
        .expect("login");
    assert_eq!(user.name, "김파이");
    assert_eq!(client.session().identity().await.as_str(), "42");

    client.logout().await.expect("logout");
    assert_eq!(client.session().current_user().await, None);
    assert_eq!(session_events(&mut rx), vec![true, false]);
}

#[tokio::test]
async fn rejected_login_publishes_nothing() {
    let client = client(FakeAuthBackend::rejecting(), memory_session().await);
    let mut rx = client.subscribe_events();

    let err = client.login("e", "p", false).await.expect_err("rejected");
    assert_eq!(err.notice(), error::LOGIN_FAILED_NOTICE);
    assert!(session_events(&mut rx).is_empty());
}

#[tokio::test]
async fn signup_goes_through_the_auth_backend() {
    let client = client(
        FakeAuthBackend::accepting("김파이", None),
        memory_session().await,
    );
    client
        .signup(SignupForm {
            name: "김파이".into(),
            email: "kim@example.com".into(),
            password: "pw".into(),
            password_confirm: "pw".into(),
        })
        .await
        .expect("signup");
    assert_eq!(client.session().current_user().await, None);
}

#[tokio::test]
async fn open_applies_configured_logout_policy() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let settings = TutorSettings {
        logout_policy: LogoutPolicy::ResetIdentity,
        ..TutorSettings::default()
    };
    let client = TutorClient::open(
        settings,
        storage.clone(),
        Arc::new(MissingTutorBackend),
        Arc::new(MissingAuthBackend),
    )
    .await
    .expect("open");

    assert_eq!(
        client.session().logout_policy(),
        LogoutPolicy::ResetIdentity
    );
    storage.set(keys::TOKEN, "t").await.expect("set");
    client.logout().await.expect("logout");
    assert_eq!(storage.get(keys::TOKEN).await.expect("get"), None);
    assert_eq!(
        storage.get(keys::USER_ID).await.expect("get").as_deref(),
        Some(client.session().identity().await.as_str())
    );
}

#[tokio::test]
async fn offline_client_resolves_everything_with_fixed_failures() {
    let client = TutorClient::offline(TutorSettings::default(), memory_session().await);

    client
        .conversation()
        .submit("안녕")
        .await
        .expect("accepted");
    let turn = client.conversation().turn(0).await.expect("turn");
    assert_eq!(turn.assistant_text.as_deref(), Some(CHAT_FAILURE_MESSAGE));

    let verdict = client.submission().submit_code("print(1)").await;
    assert_eq!(verdict, Some(Verdict::TransportError));
    assert!(client.login("e", "p", true).await.is_err());
}

#[tokio::test]
async fn controllers_share_one_event_channel() {
    let client = client(FakeAuthBackend::rejecting(), memory_session().await);
    let mut rx = client.subscribe_events();

    client.view().toggle().await;
    client.submission().submit_code("x = 1").await;
    client.shutdown().await;

    let mut saw_view = false;
    let mut saw_submission = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            TutorEvent::ViewChanged(_) => saw_view = true,
            TutorEvent::SubmissionFinished { verdict } => {
                assert_eq!(verdict, Verdict::Correct);
                saw_submission = true;
            }
            _ => {}
        }
    }
    assert!(saw_view && saw_submission);
    assert_eq!(client.view().snapshot().target, Pane::CodeEditor);
}
