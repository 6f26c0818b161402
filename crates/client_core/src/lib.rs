use std::{sync::Arc, time::Duration};

use anyhow::Result;
use shared::domain::{AuthUser, ProblemNumber, Verdict};
use storage::Storage;
use tokio::sync::broadcast;
use tracing::info;

pub mod backend;
pub mod conversation;
pub mod effect;
pub mod error;
pub mod feedback;
pub mod reveal;
pub mod session;
pub mod submission;
pub mod timer;
pub mod view;

pub use backend::{
    AuthBackend, HttpAuthBackend, HttpTutorBackend, MissingAuthBackend, MissingTutorBackend,
    TutorBackend,
};
pub use conversation::{ConversationController, Turn};
pub use error::{AuthError, BackendError};
pub use session::{LogoutPolicy, Session, SignupForm};
pub use submission::{SubmissionController, SubmissionResult};
pub use view::{Pane, Theme, ViewController, ViewPhase, ViewSnapshot};

use crate::timer::TimerSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TutorSettings {
    pub reveal_interval: Duration,
    pub timer_grace: Duration,
    pub timer_tick: Duration,
    pub mount_delay: Duration,
    pub transition: Duration,
    pub copy_revert: Duration,
    pub logout_policy: LogoutPolicy,
}

impl Default for TutorSettings {
    fn default() -> Self {
        Self {
            reveal_interval: Duration::from_millis(50),
            timer_grace: Duration::from_millis(500),
            timer_tick: Duration::from_millis(100),
            mount_delay: Duration::from_millis(50),
            transition: Duration::from_millis(500),
            copy_revert: Duration::from_secs(2),
            logout_policy: LogoutPolicy::default(),
        }
    }
}

impl TutorSettings {
    pub fn timer(&self) -> TimerSettings {
        TimerSettings {
            grace: self.timer_grace,
            tick: self.timer_tick,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TutorEvent {
    TurnStarted {
        turn: usize,
    },
    TurnResolved {
        turn: usize,
        succeeded: bool,
    },
    RevealToken {
        turn: usize,
        token: String,
    },
    RevealCompleted {
        turn: usize,
    },
    SubmissionStarted {
        problem: ProblemNumber,
    },
    SubmissionFinished {
        verdict: Verdict,
    },
    ViewChanged(ViewSnapshot),
    SessionChanged {
        signed_in: bool,
    },
}

pub struct TutorClient {
    settings: TutorSettings,
    session: Arc<Session>,
    auth: Arc<dyn AuthBackend>,
    conversation: Arc<ConversationController>,
    submission: Arc<SubmissionController>,
    view: ViewController,
    events: broadcast::Sender<TutorEvent>,
}

impl TutorClient {
    pub fn new(
        settings: TutorSettings,
        session: Arc<Session>,
        tutor: Arc<dyn TutorBackend>,
        auth: Arc<dyn AuthBackend>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(1024);
        let conversation = ConversationController::new(
            Arc::clone(&tutor),
            Arc::clone(&session),
            settings,
            events.clone(),
        );
        let submission = SubmissionController::new(tutor, Arc::clone(&session), events.clone());
        let view = ViewController::new(settings.mount_delay, settings.transition, events.clone());

        Arc::new(Self {
            settings,
            session,
            auth,
            conversation,
            submission,
            view,
            events,
        })
    }

    pub fn offline(settings: TutorSettings, session: Arc<Session>) -> Arc<Self> {
        Self::new(
            settings,
            session,
            Arc::new(MissingTutorBackend),
            Arc::new(MissingAuthBackend),
        )
    }

    pub async fn open(
        settings: TutorSettings,
        storage: Storage,
        tutor: Arc<dyn TutorBackend>,
        auth: Arc<dyn AuthBackend>,
    ) -> Result<Arc<Self>> {
        let session = Arc::new(Session::open(storage, settings.logout_policy).await?);
        Ok(Self::new(settings, session, tutor, auth))
    }

    pub fn settings(&self) -> &TutorSettings {
        &self.settings
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn conversation(&self) -> &Arc<ConversationController> {
        &self.conversation
    }

    pub fn submission(&self) -> &Arc<SubmissionController> {
        &self.submission
    }

    pub fn view(&self) -> &ViewController {
        &self.view
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TutorEvent> {
        self.events.subscribe()
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<AuthUser, AuthError> {
        let user = self
            .session
            .login(self.auth.as_ref(), email, password, remember_me)
            .await?;
        let _ = self.events.send(TutorEvent::SessionChanged { signed_in: true });
        Ok(user)
    }

    pub async fn signup(&self, form: SignupForm) -> Result<(), AuthError> {
        self.session.signup(self.auth.as_ref(), form).await
    }

    pub async fn logout(&self) -> Result<()> {
        self.session.logout().await?;
        let _ = self
            .events
            .send(TutorEvent::SessionChanged { signed_in: false });
        Ok(())
    }

    pub async fn shutdown(&self) {
        self.conversation.shutdown().await;
        self.view.shutdown().await;
        info!("tutor client shut down");
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod tests_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
