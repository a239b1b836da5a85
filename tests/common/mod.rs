//! Common test utilities for integration tests
//!
//! In-memory collaborators standing in for an orchestrator API.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use convergent::{AccessError, EntityWriter, Named, SnapshotSource, StabilityCheck};

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A control plane machine as the tests see it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    pub name: String,
    pub instance_type: String,
    pub phase: String,
}

impl Machine {
    pub fn running(name: &str, instance_type: &str) -> Self {
        Self {
            name: name.to_string(),
            instance_type: instance_type.to_string(),
            phase: "Running".to_string(),
        }
    }
}

impl Named for Machine {
    fn name(&self) -> &str {
        &self.name
    }
}

/// In-memory machine store implementing both accessors
///
/// Writes are answered from a script of results first, then succeed.
#[derive(Default)]
pub struct MachineStore {
    machines: Mutex<Vec<Machine>>,
    write_script: Mutex<VecDeque<Result<(), AccessError>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MachineStore {
    pub fn with_machines(machines: Vec<Machine>) -> Self {
        Self {
            machines: Mutex::new(machines),
            ..Self::default()
        }
    }

    pub fn insert(&self, machine: Machine) {
        self.machines.lock().unwrap().push(machine);
    }

    pub fn script_writes(&self, results: Vec<Result<(), AccessError>>) {
        self.write_script.lock().unwrap().extend(results);
    }

    pub fn get(&self, name: &str) -> Option<Machine> {
        self.machines
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.name == name)
            .cloned()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSource<Machine> for MachineStore {
    async fn list(&self, collection: &str) -> Result<Vec<Machine>, AccessError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if collection != "machines" {
            return Err(AccessError::NotFound(collection.to_string()));
        }
        Ok(self.machines.lock().unwrap().clone())
    }
}

#[async_trait]
impl EntityWriter<Machine> for MachineStore {
    async fn update(&self, entity: &Machine) -> Result<(), AccessError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(result) = self.write_script.lock().unwrap().pop_front() {
            result?;
        }

        let mut machines = self.machines.lock().unwrap();
        match machines.iter_mut().find(|m| m.name == entity.name) {
            Some(stored) => {
                *stored = entity.clone();
                Ok(())
            }
            None => Err(AccessError::Rejected(format!("{} does not exist", entity.name))),
        }
    }
}

/// Stability probe reporting stable from the n-th call on
pub struct StableAfter {
    calls: AtomicUsize,
    stable_from: usize,
}

impl StableAfter {
    pub const fn new(stable_from: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            stable_from,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StabilityCheck for StableAfter {
    async fn is_stable(&self) -> Result<bool, AccessError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(call >= self.stable_from)
    }
}
