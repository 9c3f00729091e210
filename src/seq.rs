// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The board-init sequencer.
//!
//! Board bring-up is a short, ordered list of loosely related hardware-enable
//! actions: turn on a rail, read the strap register, size DRAM, stash the
//! boot parameters. The ordering is load-bearing (a regulator must be up
//! before the device it powers is probed), but the steps are otherwise
//! independent -- a missing LED driver must not prevent DRAM sizing from
//! completing. The sequencer encodes exactly that: strict order, each step at
//! most once, required failures abort, optional failures are logged and
//! recorded.
//!
//! There is deliberately no retry machinery here. Boot firmware has no notion
//! of re-running initialization within a single boot attempt; if a step needs
//! a bounded settle wait, that budget belongs to the step's own action (see
//! the regulator step), not to the sequencer.

use thiserror::Error;

use crate::platform::Platform;
use crate::regmap::{FieldError, RegisterBus};
use crate::BootContext;

/// Everything a step action may touch: the platform descriptor it is
/// parameterized by, the register bus, and the context it is populating.
pub struct StepContext<'a> {
    pub platform: &'static Platform,
    pub bus: &'a mut dyn RegisterBus,
    pub ctx: &'a mut BootContext,
}

/// One board-init step. Supplied as `&'static [InitStep]` in the platform
/// descriptor; the order of the slice is the order of execution.
pub struct InitStep {
    pub name: &'static str,
    /// Required steps abort the sequence on failure; optional steps log a
    /// warning and let the sequence continue.
    pub required: bool,
    pub run: fn(&mut StepContext<'_>) -> Result<(), StepError>,
}

/// Ways an individual step action can fail.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum StepError {
    #[error(transparent)]
    Field(#[from] FieldError),
    /// The scratch register left by the previous stage reads as zero.
    #[error("previous boot stage reported no DRAM")]
    NoDramConfigured,
    /// A rail's status field never came up within the descriptor's budget.
    #[error("regulator {name} did not settle within {polls} polls")]
    RegulatorTimeout { name: &'static str, polls: u32 },
    /// The platform descriptor does not define what the step needs. Only
    /// reachable if a steps list references hardware its own descriptor
    /// leaves out.
    #[error("platform does not describe a {what}")]
    NotSupported { what: &'static str },
}

/// The sequence aborted at a required step. Optional-step failures never
/// surface here; they are carried in the [`SequenceReport`].
#[derive(Debug, Error, Eq, PartialEq)]
pub enum SequenceError {
    #[error("required init step {step} failed")]
    RequiredStepFailed {
        step: &'static str,
        #[source]
        cause: StepError,
    },
}

/// Upper bound on warning names retained per boot. Failures past the cap are
/// still counted, just not named; real step lists are far shorter than this.
pub const MAX_WARNINGS: usize = 8;

/// Names of optional steps that failed, in execution order.
#[derive(Debug)]
pub struct WarningLog {
    names: [Option<&'static str>; MAX_WARNINGS],
    count: usize,
}

impl WarningLog {
    pub const fn new() -> Self {
        Self {
            names: [None; MAX_WARNINGS],
            count: 0,
        }
    }

    fn record(&mut self, name: &'static str) {
        if self.count < MAX_WARNINGS {
            self.names[self.count] = Some(name);
        }
        self.count += 1;
    }

    /// Total number of warnings recorded, including any past the cap.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.names.iter().filter_map(|name| *name)
    }
}

impl Default for WarningLog {
    fn default() -> Self {
        Self::new()
    }
}

/// What a completed sequence looked like.
#[derive(Debug)]
pub struct SequenceReport {
    /// Number of steps that executed (including optional steps that failed).
    pub steps_run: usize,
    pub warnings: WarningLog,
}

/// Runs `steps` strictly in order against `cx`.
///
/// Each step runs at most once. A required step's failure aborts immediately
/// -- later steps never execute -- and comes back wrapped with the step's name.
/// An optional step's failure is logged, recorded in the report, and the
/// sequence continues.
pub fn run(
    steps: &[InitStep],
    cx: &mut StepContext<'_>,
) -> Result<SequenceReport, SequenceError> {
    let mut report = SequenceReport {
        steps_run: 0,
        warnings: WarningLog::new(),
    };

    for step in steps {
        match (step.run)(cx) {
            Ok(()) => {
                report.steps_run += 1;
            }
            Err(cause) if step.required => {
                log::error!("init step {} failed: {}", step.name, cause);
                return Err(SequenceError::RequiredStepFailed {
                    step: step.name,
                    cause,
                });
            }
            Err(cause) => {
                log::warn!("init step {} failed (continuing): {}", step.name, cause);
                report.warnings.record(step.name);
                report.steps_run += 1;
            }
        }
    }

    log::info!(
        "board init complete: {} steps, {} warnings",
        report.steps_run,
        report.warnings.len()
    );
    Ok(report)
}
