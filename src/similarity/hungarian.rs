//! Kuhn–Munkres assignment solver.
//!
//! The cost matrix is padded to a square matrix with zero-cost dummy rows and
//! columns, then solved in `O(n³)` with the labeling formulation: workers are
//! rows, jobs are columns, and each phase grows an alternating tree from one
//! unmatched worker until an augmenting path is found.

use crate::errors::{Error, Result};

/// Job assigned to each worker; `None` when the worker landed on padding.
pub type Assignment = Vec<Option<usize>>;

/// Computes a minimum-cost assignment of rows to columns.
///
/// Rows shorter than the longest row are padded with zero costs. The result
/// has one entry per row and never uses a column twice. A matrix without
/// rows or without columns yields an all-unmatched assignment.
///
/// # Errors
/// Returns [`Error::AssignmentInputInvalid`] for a negative or non-finite cost
/// and [`Error::AssignmentStalled`] if a phase finds no augmenting path.
pub fn solve(costs: &[Vec<f64>]) -> Result<Assignment> {
    let rows = costs.len();
    let cols = costs.iter().map(Vec::len).max().unwrap_or(0);
    for (row, values) in costs.iter().enumerate() {
        for (col, &value) in values.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::AssignmentInputInvalid { row, col, value });
            }
        }
    }
    if rows == 0 || cols == 0 {
        return Ok(vec![None; rows]);
    }

    let mut solver = Solver::new(costs, rows.max(cols));
    solver.execute()?;

    Ok(solver.match_job_by_worker[..rows]
        .iter()
        .map(|job| job.filter(|&job| job < cols))
        .collect())
}

/// Sum of the costs selected by `assignment`.
#[must_use]
pub fn total_cost(costs: &[Vec<f64>], assignment: &[Option<usize>]) -> f64 {
    assignment
        .iter()
        .zip(costs)
        .filter_map(|(job, row)| job.and_then(|job| row.get(job)))
        .sum()
}

struct Solver {
    dim: usize,
    costs: Vec<Vec<f64>>,
    label_by_worker: Vec<f64>,
    label_by_job: Vec<f64>,
    min_slack_worker_by_job: Vec<usize>,
    min_slack_value_by_job: Vec<f64>,
    committed_workers: Vec<bool>,
    parent_worker_by_committed_job: Vec<Option<usize>>,
    match_job_by_worker: Vec<Option<usize>>,
    match_worker_by_job: Vec<Option<usize>>,
}

impl Solver {
    fn new(costs: &[Vec<f64>], dim: usize) -> Self {
        let mut square = vec![vec![0.0; dim]; dim];
        for (target, source) in square.iter_mut().zip(costs) {
            target[..source.len()].copy_from_slice(source);
        }
        Self {
            dim,
            costs: square,
            label_by_worker: vec![0.0; dim],
            label_by_job: vec![0.0; dim],
            min_slack_worker_by_job: vec![0; dim],
            min_slack_value_by_job: vec![0.0; dim],
            committed_workers: vec![false; dim],
            parent_worker_by_committed_job: vec![None; dim],
            match_job_by_worker: vec![None; dim],
            match_worker_by_job: vec![None; dim],
        }
    }

    fn execute(&mut self) -> Result<()> {
        self.reduce();
        self.compute_initial_feasible_solution();
        self.greedy_match();

        while let Some(worker) = self.unmatched_worker() {
            self.initialize_phase(worker);
            self.execute_phase(worker)?;
        }
        Ok(())
    }

    /// Subtracts row minima, then column minima.
    fn reduce(&mut self) {
        for row in &mut self.costs {
            let min = row.iter().copied().fold(f64::INFINITY, f64::min);
            for value in row.iter_mut() {
                *value -= min;
            }
        }
        for job in 0..self.dim {
            let min = self
                .costs
                .iter()
                .map(|row| row[job])
                .fold(f64::INFINITY, f64::min);
            for row in &mut self.costs {
                row[job] -= min;
            }
        }
    }

    fn compute_initial_feasible_solution(&mut self) {
        for job in 0..self.dim {
            self.label_by_job[job] = self
                .costs
                .iter()
                .map(|row| row[job])
                .fold(f64::INFINITY, f64::min);
        }
    }

    fn slack(&self, worker: usize, job: usize) -> f64 {
        self.costs[worker][job] - self.label_by_worker[worker] - self.label_by_job[job]
    }

    fn greedy_match(&mut self) {
        for worker in 0..self.dim {
            for job in 0..self.dim {
                if self.match_job_by_worker[worker].is_none()
                    && self.match_worker_by_job[job].is_none()
                    && self.slack(worker, job) == 0.0
                {
                    self.assign(worker, job);
                }
            }
        }
    }

    fn unmatched_worker(&self) -> Option<usize> {
        self.match_job_by_worker.iter().position(Option::is_none)
    }

    fn initialize_phase(&mut self, worker: usize) {
        self.committed_workers.fill(false);
        self.parent_worker_by_committed_job.fill(None);
        self.committed_workers[worker] = true;
        for job in 0..self.dim {
            self.min_slack_value_by_job[job] = self.slack(worker, job);
            self.min_slack_worker_by_job[job] = worker;
        }
    }

    /// Grows the alternating tree rooted at `root` until an augmenting path
    /// is applied.
    ///
    /// Fails only if every job is already in the tree, which cannot happen
    /// while a worker is unmatched on finite input.
    fn execute_phase(&mut self, root: usize) -> Result<()> {
        loop {
            let mut best: Option<(usize, usize, f64)> = None;
            for job in 0..self.dim {
                if self.parent_worker_by_committed_job[job].is_some() {
                    continue;
                }
                let value = self.min_slack_value_by_job[job];
                if best.map_or(true, |(_, _, min)| value < min) {
                    best = Some((self.min_slack_worker_by_job[job], job, value));
                }
            }
            let Some((worker, job, slack)) = best else {
                return Err(Error::AssignmentStalled { worker: root });
            };

            if slack > 0.0 {
                self.update_labeling(slack);
            }
            self.parent_worker_by_committed_job[job] = Some(worker);

            let Some(matched) = self.match_worker_by_job[job] else {
                self.augment(worker, job);
                return Ok(());
            };

            self.committed_workers[matched] = true;
            for candidate in 0..self.dim {
                if self.parent_worker_by_committed_job[candidate].is_some() {
                    continue;
                }
                let slack = self.slack(matched, candidate);
                if self.min_slack_value_by_job[candidate] > slack {
                    self.min_slack_value_by_job[candidate] = slack;
                    self.min_slack_worker_by_job[candidate] = matched;
                }
            }
        }
    }

    /// Flips the matching along the tree path ending at the free `job`.
    fn augment(&mut self, worker: usize, job: usize) {
        let mut parent_worker = worker;
        let mut committed_job = job;
        loop {
            let previous = self.match_job_by_worker[parent_worker];
            self.assign(parent_worker, committed_job);
            let Some(job) = previous else { break };
            let Some(worker) = self.parent_worker_by_committed_job[job] else {
                break;
            };
            committed_job = job;
            parent_worker = worker;
        }
    }

    fn update_labeling(&mut self, slack: f64) {
        for worker in 0..self.dim {
            if self.committed_workers[worker] {
                self.label_by_worker[worker] += slack;
            }
        }
        for job in 0..self.dim {
            if self.parent_worker_by_committed_job[job].is_some() {
                self.label_by_job[job] -= slack;
            } else {
                self.min_slack_value_by_job[job] -= slack;
            }
        }
    }

    fn assign(&mut self, worker: usize, job: usize) {
        self.match_job_by_worker[worker] = Some(job);
        self.match_worker_by_job[job] = Some(worker);
    }
}
