//! Concurrent fan-out of all checks in all groups.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::probe::{Check, CheckResult, Group, ProberSet};

/// Results for one group. Ordering inside `results` is not meaningful.
#[derive(Debug, Clone, Serialize)]
pub struct GroupResult {
    pub title: String,
    pub results: Vec<CheckResult>,
}

/// Runs every check of every group concurrently and waits for all of them.
pub struct ConcurrentRunner {
    probers: ProberSet,
    limiter: Arc<Semaphore>,
}

impl ConcurrentRunner {
    /// `max_concurrency` permits are shared by all probes of a cycle.
    pub fn new(probers: ProberSet, max_concurrency: usize) -> Self {
        Self {
            probers,
            limiter: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    /// Probe everything and return once every probe has finished.
    pub async fn run(&self, groups: &[Group]) -> Vec<GroupResult> {
        let group_tasks: Vec<(String, Vec<String>, JoinHandle<Vec<CheckResult>>)> = groups
            .iter()
            .map(|group| {
                let names = group.checks.iter().map(|c| c.name.clone()).collect();
                let handle = tokio::spawn(run_group(
                    group.clone(),
                    self.probers.clone(),
                    self.limiter.clone(),
                ));
                (group.title.clone(), names, handle)
            })
            .collect();

        let mut out = Vec::with_capacity(group_tasks.len());
        for (title, names, handle) in group_tasks {
            let results = match handle.await {
                Ok(results) => results,
                Err(e) => {
                    tracing::error!("Group task for {} failed: {}", title, e);
                    names
                        .into_iter()
                        .map(|name| CheckResult { name, status: false })
                        .collect()
                }
            };
            out.push(GroupResult { title, results });
        }
        out
    }
}

async fn run_group(group: Group, probers: ProberSet, limiter: Arc<Semaphore>) -> Vec<CheckResult> {
    let tasks: Vec<(String, JoinHandle<bool>)> = group
        .checks
        .into_iter()
        .map(|check| {
            let name = check.name.clone();
            let handle = tokio::spawn(run_check(check, probers.clone(), limiter.clone()));
            (name, handle)
        })
        .collect();

    let mut results = Vec::with_capacity(tasks.len());
    for (name, handle) in tasks {
        let status = match handle.await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!("Probe task for {} failed: {}", name, e);
                false
            }
        };
        results.push(CheckResult { name, status });
    }
    results
}

async fn run_check(check: Check, probers: ProberSet, limiter: Arc<Semaphore>) -> bool {
    // The semaphore is never closed, so acquire only fails on a logic error.
    let _permit = match limiter.acquire_owned().await {
        Ok(p) => p,
        Err(_) => return false,
    };
    probers.probe(&check).await
}
