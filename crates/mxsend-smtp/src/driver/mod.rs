//! Sequential protocol driver.
//!
// Allow missing_const_for_fn since VecDeque and Box methods aren't const in stable Rust.
#![allow(clippy::missing_const_for_fn)]
//!
//! The driver holds an ordered queue of single-shot [`Step`]s. Each inbound
//! response line is handed to exactly one step, in enqueue order, and the
//! next line is only accepted once that step has signalled completion. This
//! encodes SMTP's lock-step ordering: one command outstanding at a time.
//!
//! The driver performs no I/O. Steps write their output into the context
//! value `C` they are run with; the caller drains it onto the transport.
//!
//! # Example
//!
//! ```ignore
//! use mxsend_smtp::driver::{Driver, StepOutcome};
//!
//! let mut driver: Driver<Vec<String>, String> = Driver::new();
//! driver
//!     .enqueue(|line: &str, out: &mut Vec<String>| {
//!         out.push(format!("got {line}"));
//!         StepOutcome::Proceed
//!     })
//!     .on_failure(|cause| eprintln!("failed: {cause}"));
//!
//! let mut out = Vec::new();
//! driver.deliver("220 ready", &mut out)?;
//! ```

mod completion;

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, error, trace};

pub use completion::Completion;

/// Signal produced by a step once it has looked at its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome<E> {
    /// Success; the next line goes to the next step.
    Proceed,
    /// Success; the exchange is complete and the driver terminates.
    Finished,
    /// Failure; the driver terminates and the failure handler fires.
    Fail(E),
    /// The step has not signalled yet. The driver stays busy until
    /// [`Driver::complete`] is called.
    Deferred,
}

/// A unit of protocol logic: inspect the last response line, emit output.
///
/// Closures of the form `FnOnce(&str, &mut C) -> StepOutcome<E>` are steps.
pub trait Step<C, E> {
    /// Runs the step with the line that triggered it.
    fn run(self: Box<Self>, line: &str, ctx: &mut C) -> StepOutcome<E>;
}

impl<C, E, F> Step<C, E> for F
where
    F: FnOnce(&str, &mut C) -> StepOutcome<E>,
{
    fn run(self: Box<Self>, line: &str, ctx: &mut C) -> StepOutcome<E> {
        (*self)(line, ctx)
    }
}

/// Violation of the driver's one-line-per-step contract.
///
/// These are defects in the code wiring the driver to a transport, never
/// protocol conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Misuse {
    /// A line was delivered after the driver terminated.
    #[error("line delivered after the driver terminated")]
    Terminated,
    /// A line was delivered while the previous step had not signalled.
    #[error("line delivered while a step is still in flight")]
    Busy,
    /// A completion was reported with no step in flight.
    #[error("completion reported with no step in flight")]
    Idle,
}

type FailureHandler<E> = Box<dyn FnOnce(E) + Send>;

/// Ordered queue of steps with single-step-in-flight enforcement.
pub struct Driver<C, E> {
    /// Remaining steps, FIFO.
    pending: VecDeque<Box<dyn Step<C, E> + Send>>,
    /// A step is running and has not signalled.
    busy: bool,
    /// No further steps may run.
    terminated: bool,
    /// Taken on first failure.
    on_failure: Option<FailureHandler<E>>,
}

impl<C, E> Default for Driver<C, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, E> Driver<C, E> {
    /// Creates an empty driver.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            busy: false,
            terminated: false,
            on_failure: None,
        }
    }

    /// Appends a step to the pending queue.
    pub fn enqueue<S>(&mut self, step: S) -> &mut Self
    where
        S: Step<C, E> + Send + 'static,
    {
        self.pending.push_back(Box::new(step));
        self
    }

    /// Registers the handler invoked the first time any step fails.
    ///
    /// Registering again replaces a handler that has not fired yet.
    pub fn on_failure<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnOnce(E) + Send + 'static,
    {
        self.on_failure = Some(Box::new(handler));
        self
    }

    /// Hands a response line to the next pending step.
    ///
    /// A call with nothing left in the queue is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Misuse::Terminated`] after termination and [`Misuse::Busy`]
    /// while the previous step has not signalled.
    pub fn deliver(&mut self, line: &str, ctx: &mut C) -> Result<(), Misuse> {
        if self.terminated {
            error!(line, "line delivered to a terminated driver");
            return Err(Misuse::Terminated);
        }
        if self.busy {
            error!(line, "line delivered while a step is in flight");
            return Err(Misuse::Busy);
        }

        let Some(step) = self.pending.pop_front() else {
            trace!(line, "no pending step, line ignored");
            return Ok(());
        };

        self.busy = true;
        let outcome = step.run(line, ctx);
        self.settle(outcome);
        Ok(())
    }

    /// Reports the outcome of a step that returned [`StepOutcome::Deferred`].
    ///
    /// A failure reported after [`terminate`](Self::terminate) does not fire
    /// the failure handler: the caller that terminated already owns the
    /// outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Misuse::Idle`] if no step is in flight.
    pub fn complete(&mut self, outcome: StepOutcome<E>) -> Result<(), Misuse> {
        if !self.busy {
            error!("completion reported with no step in flight");
            return Err(Misuse::Idle);
        }
        self.settle(outcome);
        Ok(())
    }

    /// Forces termination. Idempotent; never fires the failure handler.
    pub fn terminate(&mut self) {
        if !self.terminated {
            debug!(remaining = self.pending.len(), "driver terminated");
        }
        self.terminated = true;
    }

    /// Returns true once no further steps may run.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Returns true while a step has not signalled completion.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Returns the number of steps not yet started.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    fn settle(&mut self, outcome: StepOutcome<E>) {
        match outcome {
            StepOutcome::Deferred => {}
            StepOutcome::Proceed => self.busy = false,
            StepOutcome::Finished => {
                self.busy = false;
                self.terminated = true;
            }
            StepOutcome::Fail(cause) => {
                self.busy = false;
                if self.terminated {
                    debug!("failure after termination dropped");
                    return;
                }
                self.terminated = true;
                if let Some(handler) = self.on_failure.take() {
                    handler(cause);
                }
            }
        }
    }
}

impl<C, E> fmt::Debug for Driver<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("pending", &self.pending.len())
            .field("busy", &self.busy)
            .field("terminated", &self.terminated)
            .field("has_failure_handler", &self.on_failure.is_some())
            .finish()
    }
}
