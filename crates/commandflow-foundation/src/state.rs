use crate::error::AppError;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Initializing,
    Running,
    Recovering { from_error: String },
    Stopping,
    Stopped,
}

pub struct StateManager {
    state: Arc<RwLock<AppState>>,
    state_tx: Sender<AppState>,
    state_rx: Receiver<AppState>,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    pub fn new() -> Self {
        let (state_tx, state_rx) = crossbeam_channel::unbounded();
        Self {
            state: Arc::new(RwLock::new(AppState::Initializing)),
            state_tx,
            state_rx,
        }
    }

    pub fn transition(&self, new_state: AppState) -> Result<(), AppError> {
        let mut current = self.state.write();

        let valid = matches!(
            (&*current, &new_state),
            (AppState::Initializing, AppState::Running)
                | (AppState::Running, AppState::Recovering { .. })
                | (AppState::Running, AppState::Stopping)
                | (AppState::Recovering { .. }, AppState::Running)
                | (AppState::Recovering { .. }, AppState::Stopping)
                | (AppState::Stopping, AppState::Stopped)
        );

        if !valid {
            return Err(AppError::Fatal(format!(
                "Invalid state transition: {:?} -> {:?}",
                *current, new_state
            )));
        }

        tracing::info!("State transition: {:?} -> {:?}", *current, new_state);
        *current = new_state.clone();
        let _ = self.state_tx.send(new_state);
        Ok(())
    }

    pub fn current(&self) -> AppState {
        self.state.read().clone()
    }

    pub fn subscribe(&self) -> Receiver<AppState> {
        self.state_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_lifecycle() {
        let mgr = StateManager::new();
        assert_eq!(mgr.current(), AppState::Initializing);
        mgr.transition(AppState::Running).unwrap();
        mgr.transition(AppState::Stopping).unwrap();
        mgr.transition(AppState::Stopped).unwrap();
        assert_eq!(mgr.current(), AppState::Stopped);
    }

    #[test]
    fn recovery_excursion() {
        let mgr = StateManager::new();
        mgr.transition(AppState::Running).unwrap();
        mgr.transition(AppState::Recovering {
            from_error: "stream died".into(),
        })
        .unwrap();
        mgr.transition(AppState::Running).unwrap();
    }

    #[test]
    fn invalid_transition_rejected() {
        let mgr = StateManager::new();
        assert!(mgr.transition(AppState::Stopped).is_err());
        assert_eq!(mgr.current(), AppState::Initializing);
    }

    #[test]
    fn subscriber_sees_transitions() {
        let mgr = StateManager::new();
        let rx = mgr.subscribe();
        mgr.transition(AppState::Running).unwrap();
        assert_eq!(rx.try_recv().unwrap(), AppState::Running);
    }
}
