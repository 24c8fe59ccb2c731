//! Observers notified after every update.

use std::cell::RefCell;
use std::rc::Rc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::A2cError;

/// Emitted once per completed update.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UpdateEvent {
    /// Update index, starting at 1.
    pub iteration: u64,
    /// Mean episodic reward of the most recent update in which episodes ended.
    pub fitness: f64,
    /// Mean policy entropy over the rollout.
    pub entropy: f64,
    pub actor_loss: f64,
    pub critic_loss: f64,
    /// Combined loss that was minimized.
    pub loss: f64,
    /// Environment frames processed so far.
    pub frames: u64,
}

/// Receives training lifecycle events.
///
/// Reporters run in registration order. An error aborts the training run.
pub trait Reporter {
    fn on_update_end(&mut self, event: &UpdateEvent) -> Result<(), A2cError>;

    /// Human-readable name. Errors a reporter raises are tagged with it.
    fn name(&self) -> String {
        "reporter".to_string()
    }
}

/// Keeps every update event, e.g. to plot a learning curve.
#[derive(Debug, Default, Clone)]
pub struct HistoryReporter {
    events: Vec<UpdateEvent>,
}

impl HistoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[UpdateEvent] {
        &self.events
    }

    /// `(iteration, fitness)` pairs in update order.
    pub fn learning_curve(&self) -> Vec<(u64, f64)> {
        self.events.iter().map(|e| (e.iteration, e.fitness)).collect()
    }
}

impl Reporter for HistoryReporter {
    fn on_update_end(&mut self, event: &UpdateEvent) -> Result<(), A2cError> {
        self.events.push(event.clone());
        Ok(())
    }

    fn name(&self) -> String {
        "history".to_string()
    }
}

/// Lets the caller keep a handle on a reporter owned by the trainer.
impl<R: Reporter> Reporter for Rc<RefCell<R>> {
    fn on_update_end(&mut self, event: &UpdateEvent) -> Result<(), A2cError> {
        self.borrow_mut().on_update_end(event)
    }

    fn name(&self) -> String {
        self.borrow().name()
    }
}
