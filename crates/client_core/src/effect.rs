use std::future::Future;

use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectPhase {
    #[default]
    Idle,
    Running,
    Done,
}

/// A spawned effect. Dropping the handle aborts the task.
#[derive(Debug)]
pub struct EffectHandle {
    task: JoinHandle<()>,
}

impl EffectHandle {
    pub fn spawn<F>(effect: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            task: tokio::spawn(effect),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for EffectHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Holds at most one running effect; installing a new one cancels the old.
#[derive(Debug, Default)]
pub struct EffectSlot {
    current: Option<EffectHandle>,
}

impl EffectSlot {
    pub fn replace(&mut self, handle: EffectHandle) {
        self.current = Some(handle);
    }

    pub fn cancel(&mut self) -> bool {
        self.current
            .take()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn is_running(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}
