//! Budget solves off the caller's thread.
//!
//! A [`BudgetSession`] runs at most one solve that matters at a time. Each
//! submission bumps a generation counter and cancels the solve before it.
//! A finished solve publishes its result only if its generation is still
//! current, so a slow stale search can never overwrite a newer answer.
//! Superseded workers are cancelled and joined; none outlive the session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use crate::budget::solver::{solve_budget_with_tables, BudgetInput, BudgetSolution, CancelToken, SolverConfig};
use crate::rates::tables::RateTables;
use crate::AutoLoanResult;

/// Outcome of one submitted solve.
#[derive(Debug)]
pub struct SessionResult {
    pub generation: u64,
    pub input: BudgetInput,
    pub outcome: AutoLoanResult<BudgetSolution>,
}

struct Running {
    generation: u64,
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

impl Running {
    /// Cancel the worker and wait for it to exit. The solver checks the
    /// token before every quote, so this returns after at most one quote.
    fn retire(self) {
        self.cancel.cancel();
        if self.handle.join().is_err() {
            log::warn!("budget session: worker for generation {} panicked", self.generation);
        }
    }
}

pub struct BudgetSession {
    config: SolverConfig,
    generation: Arc<AtomicU64>,
    running: Mutex<Option<Running>>,
    latest: Arc<Mutex<Option<SessionResult>>>,
}

impl Default for BudgetSession {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl BudgetSession {
    pub fn new(config: SolverConfig) -> Self {
        BudgetSession {
            config,
            generation: Arc::new(AtomicU64::new(0)),
            running: Mutex::new(None),
            latest: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Generation of the most recent submission (0 before the first).
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Start solving `input` in the background, superseding any solve in flight.
    /// Returns the new generation.
    pub fn submit(&self, input: BudgetInput) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *lock(&self.latest) = None;

        let mut running = lock(&self.running);
        if let Some(previous) = running.take() {
            log::debug!("budget session: superseding generation {}", previous.generation);
            previous.retire();
        }

        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let current = Arc::clone(&self.generation);
        let latest = Arc::clone(&self.latest);
        let config = self.config;

        log::info!("budget session: starting generation {generation}");
        let handle = std::thread::spawn(move || {
            let outcome = solve_budget_with_tables(RateTables::canonical(), &input, &config, Some(&worker_cancel));
            if worker_cancel.is_cancelled() {
                log::debug!("budget session: generation {generation} cancelled");
                return;
            }

            let mut slot = lock(&latest);
            if current.load(Ordering::SeqCst) != generation {
                log::debug!("budget session: discarding stale generation {generation}");
                return;
            }
            log::info!("budget session: generation {generation} finished");
            *slot = Some(SessionResult {
                generation,
                input,
                outcome,
            });
        });

        *running = Some(Running {
            generation,
            cancel,
            handle,
        });
        generation
    }

    /// Take the latest result if it belongs to the current generation.
    pub fn poll(&self) -> Option<SessionResult> {
        let current = self.current_generation();
        lock(&self.latest)
            .take()
            .filter(|result| result.generation == current)
    }

    /// True while the current solve is still working.
    pub fn is_running(&self) -> bool {
        lock(&self.running)
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Block until the current solve finishes, then take its result.
    pub fn wait(&self) -> Option<SessionResult> {
        let running = lock(&self.running).take();
        if let Some(r) = running {
            if r.handle.join().is_err() {
                log::warn!("budget session: worker for generation {} panicked", r.generation);
            }
        }
        self.poll()
    }

    /// Cancel the solve in flight. Any result it would have produced is dropped.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let running = lock(&self.running).take();
        if let Some(r) = running {
            log::debug!("budget session: cancelling generation {}", r.generation);
            r.retire();
        }
        *lock(&self.latest) = None;
    }
}

impl Drop for BudgetSession {
    fn drop(&mut self) {
        let running = self.running.get_mut().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(r) = running {
            r.retire();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
