//! Projected gradient ascent over the factor matrix.
//!
//! One sweep visits every node `i` in index order and every community
//! `j` in index order, computes the gradient at `F[i,j]`, and applies
//!
//! ```text
//! F[i,j] <- max(0, F[i,j] + η ∂/∂F[i,j])
//! ```
//!
//! The run is converged once a whole sweep saw no |gradient| above ε.

use crate::config::{ClamConfig, UpdateSchedule};
use crate::error::{ClamError, Result};
use crate::factor_matrix::FactorMatrix;
use crate::gradient::{GradientEngine, RowDots};
use crate::graph::Graph;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, info, warn};
use ndarray::Array2;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AscentState {
    Running,
    /// Terminal
    Converged,
}

/// What happened during one sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepSummary {
    /// 1-based sweep index
    pub sweep: usize,
    pub max_abs_gradient: f64,
    /// Denominators floored at δ during this sweep
    pub clamp_count: usize,
    pub converged: bool,
}

/// Outcome of a converged run
#[derive(Debug, Clone)]
pub struct FitReport {
    pub sweeps: usize,
    /// Denominators floored at δ over the whole run
    pub clamp_count: usize,
    /// Max |gradient| of the last sweep
    pub max_abs_gradient: f64,
    pub elapsed: Duration,
}

/// Owns the factor matrix (through an exclusive borrow) for the
/// duration of the ascent loop.
pub struct Optimizer<'a> {
    engine: GradientEngine<'a>,
    factors: &'a mut FactorMatrix,
    epsilon: f64,
    learning_rate: f64,
    schedule: UpdateSchedule,
    max_sweeps: Option<usize>,
    max_duration: Option<Duration>,
    log_every: usize,
    show_progress: bool,
    state: AscentState,
    sweeps: usize,
    clamp_count: usize,
    last: Option<SweepSummary>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> Optimizer<'a> {
    /// * `graph` - observed graph
    /// * `factors` - initialized factors, one row per node
    /// * `config` - tuning; validated here
    pub fn new(
        graph: &'a Graph,
        factors: &'a mut FactorMatrix,
        config: &ClamConfig,
    ) -> Result<Self> {
        config.validate()?;
        if factors.nrows() != graph.num_nodes() {
            return Err(ClamError::InvalidConfiguration(format!(
                "factor matrix has {} rows for {} nodes",
                factors.nrows(),
                graph.num_nodes()
            )));
        }

        Ok(Optimizer {
            engine: GradientEngine::new(graph, config.lambda, config.prob_floor),
            factors,
            epsilon: config.epsilon,
            learning_rate: config.learning_rate,
            schedule: config.schedule,
            max_sweeps: config.max_sweeps,
            max_duration: config.max_duration,
            log_every: config.log_every,
            show_progress: config.show_progress,
            state: AscentState::Running,
            sweeps: 0,
            clamp_count: 0,
            last: None,
            cancel: None,
        })
    }

    /// Poll `flag` between node updates; once it is set the run stops
    /// with `ClamError::Cancelled`.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn state(&self) -> AscentState {
        self.state
    }

    /// Number of completed sweeps
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    pub fn clamp_count(&self) -> usize {
        self.clamp_count
    }

    pub fn factors(&self) -> &FactorMatrix {
        &*self.factors
    }

    /// Run one full sweep. After convergence this is a no-op that
    /// returns the final sweep's summary.
    pub fn step(&mut self) -> Result<SweepSummary> {
        if let (AscentState::Converged, Some(last)) = (self.state, self.last) {
            return Ok(last);
        }

        let sweep = self.sweeps + 1;
        let (max_abs_gradient, clamp_count) = match self.schedule {
            UpdateSchedule::GaussSeidel => self.sweep_gauss_seidel(sweep)?,
            UpdateSchedule::Jacobi => self.sweep_jacobi(sweep)?,
        };

        let converged = max_abs_gradient <= self.epsilon;
        let summary = SweepSummary {
            sweep,
            max_abs_gradient,
            clamp_count,
            converged,
        };

        self.sweeps = sweep;
        self.clamp_count += clamp_count;
        self.last = Some(summary);
        if converged {
            self.state = AscentState::Converged;
        }

        debug!(
            "sweep {}: max|grad|={:.3e}, clamped={}",
            sweep, max_abs_gradient, clamp_count
        );
        if clamp_count > 0 {
            warn!(
                "sweep {}: {} probabilities floored at the minimum",
                sweep, clamp_count
            );
        }

        Ok(summary)
    }

    /// Sweep until convergence, a sweep/time cap, or cancellation.
    pub fn run(&mut self) -> Result<FitReport> {
        let start = Instant::now();
        let graph = self.engine.graph();

        info!(
            "BigClam: n={}, edges={}, k={}, eps={:e}, eta={}, schedule={:?}",
            graph.num_nodes(),
            graph.num_edges(),
            self.factors.ncols(),
            self.epsilon,
            self.learning_rate,
            self.schedule,
        );

        let pb = new_progress_bar(self.max_sweeps);
        if !self.show_progress {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }

        while self.state == AscentState::Running {
            if let Some(err) = self.budget_exhausted(start) {
                pb.finish_and_clear();
                warn!("{}", err);
                return Err(err);
            }

            let summary = match self.step() {
                Ok(s) => s,
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e);
                }
            };
            pb.inc(1);

            if summary.sweep % self.log_every == 0 {
                info!(
                    "  sweep {}: max|grad|={:.3e}, clamped so far={}",
                    summary.sweep, summary.max_abs_gradient, self.clamp_count
                );
            }
        }
        pb.finish_and_clear();

        let last = self.last.map(|s| s.max_abs_gradient).unwrap_or(0.0);
        let report = FitReport {
            sweeps: self.sweeps,
            clamp_count: self.clamp_count,
            max_abs_gradient: last,
            elapsed: start.elapsed(),
        };

        info!(
            "converged after {} sweeps in {:.2?} ({} clamped)",
            report.sweeps, report.elapsed, report.clamp_count
        );
        Ok(report)
    }

    fn budget_exhausted(&self, start: Instant) -> Option<ClamError> {
        let over_sweeps = self.max_sweeps.is_some_and(|m| self.sweeps >= m);
        let over_time = self.max_duration.is_some_and(|d| start.elapsed() >= d);
        if over_sweeps || over_time {
            Some(ClamError::NonConvergence {
                sweeps: self.sweeps,
                max_abs_gradient: self
                    .last
                    .map(|s| s.max_abs_gradient)
                    .unwrap_or(f64::INFINITY),
            })
        } else {
            None
        }
    }

    fn check_cancel(&self, sweep: usize) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(ClamError::Cancelled { sweeps: sweep }),
            _ => Ok(()),
        }
    }

    /// In place: row `i` sees the updates already applied to rows
    /// `0..i` and to `F[i, 0..j]`.
    fn sweep_gauss_seidel(&mut self, sweep: usize) -> Result<(f64, usize)> {
        let n = self.factors.nrows();
        let k = self.factors.ncols();
        let eta = self.learning_rate;

        let mut max_abs = 0.0_f64;
        let mut clamped = 0;

        for i in 0..n {
            self.check_cancel(sweep)?;
            let mut dots = RowDots::new(self.factors, i);
            for j in 0..k {
                let grad = self.engine.partial_cached(self.factors, &dots, j);
                clamped += grad.clamped;

                let old = self.factors.get(i, j);
                let updated = old + eta * grad.value;
                if !updated.is_finite() {
                    return Err(ClamError::NonFinite {
                        node: i,
                        community: j,
                        sweep,
                    });
                }
                self.factors.set(i, j, updated);
                dots.shift(self.factors, j, self.factors.get(i, j) - old);

                max_abs = max_abs.max(grad.value.abs());
            }
        }

        Ok((max_abs, clamped))
    }

    /// Double-buffered: all rows read the matrix as of the start of the
    /// sweep and are computed in parallel.
    fn sweep_jacobi(&mut self, sweep: usize) -> Result<(f64, usize)> {
        let eta = self.learning_rate;
        let (n, k) = (self.factors.nrows(), self.factors.ncols());
        let snapshot: &FactorMatrix = &*self.factors;
        let engine = &self.engine;
        let cancel = self.cancel.as_deref();

        let rows: Vec<(Vec<f64>, f64, usize)> = (0..snapshot.nrows())
            .into_par_iter()
            .map(|i| -> Result<(Vec<f64>, f64, usize)> {
                if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                    return Err(ClamError::Cancelled { sweeps: sweep });
                }
                let partials = engine.row_partials(snapshot, i);
                let mut row = Vec::with_capacity(partials.len());
                let mut max_abs = 0.0_f64;
                let mut clamped = 0;
                for (j, grad) in partials.iter().enumerate() {
                    let updated = snapshot.get(i, j) + eta * grad.value;
                    if !updated.is_finite() {
                        return Err(ClamError::NonFinite {
                            node: i,
                            community: j,
                            sweep,
                        });
                    }
                    row.push(updated);
                    max_abs = max_abs.max(grad.value.abs());
                    clamped += grad.clamped;
                }
                Ok((row, max_abs, clamped))
            })
            .collect::<Result<_>>()?;

        let mut next = Array2::<f64>::zeros((n, k));
        let mut max_abs = 0.0_f64;
        let mut clamped = 0;
        for (i, (row, row_max, row_clamped)) in rows.into_iter().enumerate() {
            for (dst, src) in next.row_mut(i).iter_mut().zip(row) {
                *dst = src;
            }
            max_abs = max_abs.max(row_max);
            clamped += row_clamped;
        }

        let projected = self.factors.replace_projected(next);
        debug!("sweep {}: {} entries projected to zero", sweep, projected);

        Ok((max_abs, clamped))
    }
}

fn new_progress_bar(max_sweeps: Option<usize>) -> ProgressBar {
    match max_sweeps {
        Some(m) => {
            let pb = ProgressBar::new(m as u64);
            if let Ok(style) =
                ProgressStyle::with_template("BigClam {bar:40} {pos}/{len} sweeps ({eta})")
            {
                pb.set_style(style);
            }
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("BigClam {spinner} {pos} sweeps") {
                pb.set_style(style);
            }
            pb
        }
    }
}
