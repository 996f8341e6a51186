//! Aggregate root wrapper
//!
//! Owns one aggregate instance for the duration of a unit of work: replays
//! history, dispatches commands, buffers raised events until the repository
//! persists them.

use uuid::Uuid;

use crate::domain::{DomainError, IdGenerator};

use super::Aggregate;

/// An aggregate plus its version and not-yet-persisted events
#[derive(Debug, Clone)]
pub struct AggregateRoot<A: Aggregate> {
    state: A,

    /// Number of events applied, persisted and pending
    version: i64,

    /// Version when loaded or last committed (optimistic concurrency token)
    committed_version: i64,

    pending: Vec<A::Event>,
}

impl<A: Aggregate> Default for AggregateRoot<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Aggregate> AggregateRoot<A> {
    /// A fresh aggregate with no history
    pub fn new() -> Self {
        Self {
            state: A::default(),
            version: 0,
            committed_version: 0,
            pending: Vec::new(),
        }
    }

    /// Rebuild state by applying historical events in order from empty state
    pub fn replay<I>(history: I) -> Self
    where
        I: IntoIterator<Item = A::Event>,
    {
        let mut root = Self::new();
        for event in history {
            root.state = root.state.apply(&event);
            root.version += 1;
        }
        root.committed_version = root.version;
        root
    }

    /// Run a command and raise the events it produces.
    ///
    /// Returns the newly raised events. On error nothing changes.
    pub fn dispatch(
        &mut self,
        command: A::Command,
        ids: &dyn IdGenerator,
    ) -> Result<&[A::Event], DomainError> {
        let events = self.state.handle(command, ids)?;
        let first_new = self.pending.len();
        for event in events {
            self.raise_event(event);
        }
        Ok(&self.pending[first_new..])
    }

    /// Apply an event to in-memory state and queue it for persistence
    fn raise_event(&mut self, event: A::Event) {
        let state = std::mem::take(&mut self.state);
        self.state = state.apply(&event);
        self.version += 1;
        self.pending.push(event);
    }

    /// Events raised since load or last commit
    pub fn pending_events(&self) -> &[A::Event] {
        &self.pending
    }

    /// Forget pending events once the store accepted them
    pub fn mark_committed(&mut self) {
        self.pending.clear();
        self.committed_version = self.version;
    }

    pub fn state(&self) -> &A {
        &self.state
    }

    pub fn id(&self) -> Option<Uuid> {
        self.state.id()
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn committed_version(&self) -> i64 {
        self.committed_version
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Client;
    use crate::domain::{ClientCommand, ClientInfo, ContactInfo, RandomIds};

    fn add_client() -> ClientCommand {
        ClientCommand::AddClient {
            info: ClientInfo {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                ..Default::default()
            },
            contact: ContactInfo::default(),
            address: None,
        }
    }

    #[test]
    fn test_dispatch_raises_and_applies() {
        let mut root = AggregateRoot::<Client>::new();
        let raised = root.dispatch(add_client(), &RandomIds).unwrap().to_vec();

        assert_eq!(raised.len(), 1);
        assert_eq!(root.version(), 1);
        assert_eq!(root.committed_version(), 0);
        assert!(root.id().is_some());
        assert_eq!(root.pending_events(), raised.as_slice());
    }

    #[test]
    fn test_failed_dispatch_changes_nothing() {
        let mut root = AggregateRoot::<Client>::new();
        root.dispatch(add_client(), &RandomIds).unwrap();
        let before = root.state().clone();

        let result = root.dispatch(add_client(), &RandomIds);

        assert!(matches!(result, Err(DomainError::ClientAlreadyExists(_))));
        assert_eq!(root.state(), &before);
        assert_eq!(root.version(), 1);
        assert_eq!(root.pending_events().len(), 1);
    }

    #[test]
    fn test_mark_committed_advances_token() {
        let mut root = AggregateRoot::<Client>::new();
        root.dispatch(add_client(), &RandomIds).unwrap();
        root.mark_committed();

        assert!(!root.has_pending());
        assert_eq!(root.committed_version(), 1);
    }

    #[test]
    fn test_replay_is_deterministic() {
        let mut root = AggregateRoot::<Client>::new();
        root.dispatch(add_client(), &RandomIds).unwrap();
        let id = root.id().unwrap();
        root.dispatch(ClientCommand::ArchiveClient { entity_name: id }, &RandomIds)
            .unwrap();
        let history = root.pending_events().to_vec();

        let first = AggregateRoot::<Client>::replay(history.clone());
        let second = AggregateRoot::<Client>::replay(history);

        assert_eq!(first.state(), second.state());
        assert_eq!(first.state(), root.state());
        assert_eq!(first.version(), 2);
        assert_eq!(first.committed_version(), 2);
    }
}
