//! Test doubles for the scheduling layer.

use super::traits::Executor;
use crate::types::ProbeDescriptor;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Records every executed descriptor and tracks overlap.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    delay: Duration,
    seen: Mutex<Vec<ProbeDescriptor>>,
    in_flight: Mutex<InFlight>,
}

#[derive(Debug, Default)]
struct InFlight {
    tasks: usize,
    max_tasks: usize,
    hosts: HashMap<String, usize>,
    max_hosts: usize,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn seen(&self) -> Vec<ProbeDescriptor> {
        self.seen.lock().unwrap().clone()
    }

    /// Most tasks executing at the same moment.
    pub fn max_in_flight(&self) -> usize {
        self.in_flight.lock().unwrap().max_tasks
    }

    /// Most distinct hosts with a task executing at the same moment.
    pub fn max_hosts_in_flight(&self) -> usize {
        self.in_flight.lock().unwrap().max_hosts
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn execute(&self, descriptor: ProbeDescriptor) {
        {
            let mut state = self.in_flight.lock().unwrap();
            state.tasks += 1;
            state.max_tasks = state.max_tasks.max(state.tasks);
            *state.hosts.entry(descriptor.host.clone()).or_default() += 1;
            state.max_hosts = state.max_hosts.max(state.hosts.len());
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut state = self.in_flight.lock().unwrap();
        state.tasks -= 1;
        if let Some(count) = state.hosts.get_mut(&descriptor.host) {
            *count -= 1;
            if *count == 0 {
                state.hosts.remove(&descriptor.host);
            }
        }
        drop(state);
        self.seen.lock().unwrap().push(descriptor);
    }
}

/// Panics on the first task, taking its worker down with it.
#[derive(Debug, Default)]
pub struct PanickingExecutor;

#[async_trait]
impl Executor for PanickingExecutor {
    async fn execute(&self, descriptor: ProbeDescriptor) {
        panic!("executor failed on {}", descriptor);
    }
}
