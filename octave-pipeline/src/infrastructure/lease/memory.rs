// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # In-Memory Lease Client
//!
//! A `LeaseClient` over `Arc<Mutex<HashMap<String, LeaseState>>>`. Safe for
//! concurrent use by multiple worker tasks (and, if constructed once and
//! shared, by multiple pipeline instances in the same process), which is
//! enough to reproduce the "two concurrent pipelines, shared lease backend"
//! boundary scenario from spec.md §8 in a single test process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use octave_pipeline_domain::{LeaseClient, LeaseHandle, OctaveError};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum LeaseState {
    Acquired,
    Done,
}

#[derive(Clone, Default)]
pub struct MemoryLeaseClient {
    state: Arc<Mutex<HashMap<String, LeaseState>>>,
}

impl MemoryLeaseClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaseClient for MemoryLeaseClient {
    async fn acquire(
        &self,
        name: &str,
        _metadata: Option<HashMap<String, String>>,
    ) -> Result<Box<dyn LeaseHandle>, OctaveError> {
        let mut state = self.state.lock().unwrap();
        match state.get(name) {
            Some(LeaseState::Done) => return Err(OctaveError::LeaseDone),
            Some(LeaseState::Acquired) => return Err(OctaveError::LeaseAcquired),
            None => {}
        }
        state.insert(name.to_string(), LeaseState::Acquired);
        drop(state);
        Ok(Box::new(MemoryLeaseHandle { name: name.to_string(), state: self.state.clone(), settled: false }))
    }
}

struct MemoryLeaseHandle {
    name: String,
    state: Arc<Mutex<HashMap<String, LeaseState>>>,
    settled: bool,
}

#[async_trait]
impl LeaseHandle for MemoryLeaseHandle {
    async fn done(&mut self, _metadata: Option<HashMap<String, String>>) -> Result<(), OctaveError> {
        if self.settled {
            return Ok(());
        }
        self.state.lock().unwrap().insert(self.name.clone(), LeaseState::Done);
        self.settled = true;
        Ok(())
    }

    async fn discard(&mut self) -> Result<(), OctaveError> {
        if self.settled {
            return Ok(());
        }
        // Releasing without acknowledging makes the name eligible for a
        // fresh acquire on the next cycle.
        self.state.lock().unwrap().remove(&self.name);
        self.settled = true;
        Ok(())
    }
}
