//! In-memory adapters and collaborators for pipeline tests

use async_trait::async_trait;
use cloudmirror_core::{DestinationKind, ValidationResult};
use cloudmirror_registry::{
    Authenticator, CommandOutput, CommandRunner, Invocation, RegistryAdapter,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Adapter whose push results are scripted
pub struct FakeAdapter {
    kind: DestinationKind,
    results: Mutex<VecDeque<bool>>,
    fallback: bool,
    panics: bool,
    hold: Duration,
    validation: ValidationResult,
    pushes: AtomicUsize,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl FakeAdapter {
    /// Always returns `result`
    pub fn returning(kind: DestinationKind, result: bool) -> Self {
        Self {
            kind,
            results: Mutex::new(VecDeque::new()),
            fallback: result,
            panics: false,
            hold: Duration::ZERO,
            validation: ValidationResult::ok(),
            pushes: AtomicUsize::new(0),
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns `results` in order, then `true`
    pub fn sequence(kind: DestinationKind, results: &[bool]) -> Self {
        let adapter = Self::returning(kind, true);
        *adapter.results.lock().unwrap() = results.iter().copied().collect();
        adapter
    }

    pub fn panicking(kind: DestinationKind) -> Self {
        Self {
            panics: true,
            ..Self::returning(kind, true)
        }
    }

    /// Keeps each push in flight for `hold`, tracking concurrent pushes
    pub fn holding(kind: DestinationKind, hold: Duration) -> Self {
        Self {
            hold,
            ..Self::returning(kind, true)
        }
    }

    pub fn with_validation(mut self, validation: ValidationResult) -> Self {
        self.validation = validation;
        self
    }

    pub fn pushes(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    /// Highest number of pushes observed in flight at once
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryAdapter for FakeAdapter {
    fn kind(&self) -> DestinationKind {
        self.kind
    }

    async fn push(&self, _source: &str) -> bool {
        self.pushes.fetch_add(1, Ordering::SeqCst);
        if self.panics {
            panic!("adapter failure");
        }

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.hold.is_zero() {
            tokio::time::sleep(self.hold).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback)
    }

    async fn validate_access(&self) -> ValidationResult {
        self.validation.clone()
    }
}

pub struct StaticAuthenticator(pub ValidationResult);

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate_all(&self) -> ValidationResult {
        self.0.clone()
    }
}

/// Runner where every command succeeds, or fails when `available` is false
pub struct StubRunner {
    pub available: bool,
}

#[async_trait]
impl CommandRunner for StubRunner {
    async fn run(&self, _invocation: &Invocation) -> cloudmirror_registry::Result<CommandOutput> {
        if self.available {
            Ok(CommandOutput::ok("v0.20.2"))
        } else {
            Err(cloudmirror_registry::RegistryError::CommandNotFound(
                "crane".to_string(),
            ))
        }
    }
}
