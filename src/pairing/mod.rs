mod engine;
mod service;

pub use engine::{compute_assignment, Assignment, EngineError, MAX_ATTEMPTS, MIN_PARTICIPANTS};
pub use service::{
    PairNotifier, PairingError, PairingOutcome, PairingService, PairingStore, PersistError,
};
