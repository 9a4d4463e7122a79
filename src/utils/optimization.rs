//! Derivative-free minimization for the CSS objective.
//!
//! Nelder-Mead over a box, stopped by whichever comes first: convergence,
//! the iteration cap or the wall-clock budget.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Converged,
    IterationLimit,
    TimeLimit,
    /// Nothing to optimize.
    EmptyProblem,
}

#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub stop: StopReason,
}

impl NelderMeadResult {
    pub fn converged(&self) -> bool {
        self.stop == StopReason::Converged
    }

    pub fn timed_out(&self) -> bool {
        self.stop == StopReason::TimeLimit
    }
}

/// Tuning for [`nelder_mead`].
///
/// The simplex has converged once both the spread of its objective values
/// is below `tolerance * (1 + |best|)` and every vertex lies within
/// `point_tolerance * (1 + max |x_i|)` of the centroid.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    pub max_iter: usize,
    pub max_duration: Option<Duration>,
    pub tolerance: f64,
    pub point_tolerance: f64,
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            max_duration: None,
            tolerance: 1e-8,
            point_tolerance: 1e-5,
            initial_step: 0.05,
        }
    }
}

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

struct Vertex {
    point: Vec<f64>,
    value: f64,
}

/// Vertices kept sorted best-first after every step.
struct Simplex<'a, F> {
    vertices: Vec<Vertex>,
    objective: F,
    bounds: Option<&'a [(f64, f64)]>,
}

impl<'a, F> Simplex<'a, F>
where
    F: Fn(&[f64]) -> f64,
{
    fn around(initial: &[f64], step: f64, objective: F, bounds: Option<&'a [(f64, f64)]>) -> Self {
        let mut simplex = Self {
            vertices: Vec::with_capacity(initial.len() + 1),
            objective,
            bounds,
        };
        let origin = simplex.vertex(initial.to_vec());
        simplex.vertices.push(origin);
        for i in 0..initial.len() {
            let mut point = initial.to_vec();
            point[i] += if initial[i].abs() > 1e-10 {
                step * initial[i].abs()
            } else {
                step
            };
            let vertex = simplex.vertex(point);
            simplex.vertices.push(vertex);
        }
        simplex.sort();
        simplex
    }

    fn vertex(&self, mut point: Vec<f64>) -> Vertex {
        if let Some(bounds) = self.bounds {
            for (x, (lo, hi)) in point.iter_mut().zip(bounds) {
                *x = x.clamp(*lo, *hi);
            }
        }
        let value = (self.objective)(&point);
        Vertex { point, value }
    }

    fn sort(&mut self) {
        self.vertices
            .sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));
    }

    fn best(&self) -> &Vertex {
        &self.vertices[0]
    }

    fn worst(&self) -> &Vertex {
        &self.vertices[self.vertices.len() - 1]
    }

    /// Centroid of every vertex except the worst.
    fn centroid(&self) -> Vec<f64> {
        let keep = &self.vertices[..self.vertices.len() - 1];
        let mut centroid = vec![0.0; self.best().point.len()];
        for vertex in keep {
            for (c, x) in centroid.iter_mut().zip(&vertex.point) {
                *c += x;
            }
        }
        centroid.iter_mut().for_each(|c| *c /= keep.len() as f64);
        centroid
    }

    /// Point on the ray from `centroid` through `towards`, scaled by `t`.
    fn along(&self, centroid: &[f64], towards: &[f64], t: f64) -> Vertex {
        let point = centroid
            .iter()
            .zip(towards)
            .map(|(c, p)| c + t * (p - c))
            .collect();
        self.vertex(point)
    }

    fn has_converged(&self, config: &NelderMeadConfig, centroid: &[f64]) -> bool {
        let best = self.best().value;
        let flat = self.worst().value - best <= config.tolerance * (1.0 + best.abs());
        let radius = self
            .vertices
            .iter()
            .map(|v| {
                v.point
                    .iter()
                    .zip(centroid)
                    .map(|(x, c)| (x - c).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .fold(0.0, f64::max);
        let scale = 1.0 + self.best().point.iter().fold(0.0, |m: f64, x| m.max(x.abs()));
        // Tied values alone are not enough: vertices straddling the minimum
        // score equally while the simplex is still wide.
        flat && radius <= config.point_tolerance * scale
    }

    fn replace_worst(&mut self, vertex: Vertex) {
        let last = self.vertices.len() - 1;
        self.vertices[last] = vertex;
    }

    fn shrink(&mut self) {
        let best = self.best().point.clone();
        for i in 1..self.vertices.len() {
            let point = best
                .iter()
                .zip(&self.vertices[i].point)
                .map(|(b, x)| b + SHRINK * (x - b))
                .collect();
            self.vertices[i] = self.vertex(point);
        }
    }

    fn step(&mut self, centroid: &[f64]) {
        let worst = self.worst().point.clone();
        let worst_value = self.worst().value;
        let second_worst = self.vertices[self.vertices.len() - 2].value;
        let best = self.best().value;

        let reflected = self.along(centroid, &worst, -REFLECTION);

        if reflected.value < best {
            let expanded = self.along(centroid, &reflected.point, EXPANSION);
            let winner = if expanded.value < reflected.value {
                expanded
            } else {
                reflected
            };
            self.replace_worst(winner);
        } else if reflected.value < second_worst {
            self.replace_worst(reflected);
        } else if reflected.value < worst_value {
            let contracted = self.along(centroid, &reflected.point, CONTRACTION);
            if contracted.value <= reflected.value {
                self.replace_worst(contracted);
            } else {
                self.shrink();
            }
        } else {
            let contracted = self.along(centroid, &worst, CONTRACTION);
            if contracted.value < worst_value {
                self.replace_worst(contracted);
            } else {
                self.shrink();
            }
        }
        self.sort();
    }
}

/// Minimize `objective` starting from `initial`, keeping every point inside
/// `bounds` when given.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    if initial.is_empty() {
        return NelderMeadResult {
            point: vec![],
            value: f64::NAN,
            iterations: 0,
            stop: StopReason::EmptyProblem,
        };
    }

    let started = Instant::now();
    let mut simplex = Simplex::around(initial, config.initial_step, objective, bounds);
    let mut iterations = 0;

    let stop = loop {
        if config
            .max_duration
            .is_some_and(|budget| started.elapsed() >= budget)
        {
            break StopReason::TimeLimit;
        }
        if iterations >= config.max_iter {
            break StopReason::IterationLimit;
        }
        iterations += 1;

        let centroid = simplex.centroid();
        if simplex.has_converged(&config, &centroid) {
            break StopReason::Converged;
        }
        simplex.step(&centroid);
    };

    let best = simplex.best();
    NelderMeadResult {
        point: best.point.clone(),
        value: best.value,
        iterations,
        stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bowl(x: &[f64]) -> f64 {
        (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2)
    }

    #[test]
    fn finds_minimum_of_bowl() {
        let result = nelder_mead(bowl, &[0.0, 0.0], None, NelderMeadConfig::default());

        assert!(result.converged());
        assert_relative_eq!(result.point[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(result.point[1], 3.0, epsilon = 1e-3);
    }

    #[test]
    fn stays_inside_bounds() {
        let result = nelder_mead(
            bowl,
            &[0.5, 0.5],
            Some(&[(0.0, 1.0), (0.0, 1.0)]),
            NelderMeadConfig::default(),
        );

        assert_relative_eq!(result.point[0], 1.0, epsilon = 1e-4);
        assert_relative_eq!(result.point[1], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn large_objective_values_still_converge() {
        let result = nelder_mead(
            |x| 1e9 * (1.0 + (x[0] - 0.4).powi(2)),
            &[0.0],
            Some(&[(-0.99, 0.99)]),
            NelderMeadConfig::default(),
        );

        assert!(result.converged());
        assert_relative_eq!(result.point[0], 0.4, epsilon = 1e-2);
    }

    #[test]
    fn tied_vertices_do_not_stop_the_search() {
        // Start vertices at 0.3 and 0.5 score the same around the minimum at 0.4.
        let config = NelderMeadConfig {
            initial_step: 2.0 / 3.0,
            ..Default::default()
        };
        let result = nelder_mead(|x| (x[0] - 0.4).powi(2), &[0.3], None, config);

        assert!(result.converged());
        assert!(result.iterations > 1);
        assert_relative_eq!(result.point[0], 0.4, epsilon = 1e-4);
    }

    #[test]
    fn iteration_cap() {
        let config = NelderMeadConfig {
            max_iter: 3,
            tolerance: 1e-14,
            ..Default::default()
        };
        let rosenbrock = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2);

        let result = nelder_mead(rosenbrock, &[-1.2, 1.0], None, config);

        assert_eq!(result.stop, StopReason::IterationLimit);
        assert_eq!(result.iterations, 3);
    }

    #[test]
    fn zero_time_budget() {
        let config = NelderMeadConfig {
            max_duration: Some(Duration::ZERO),
            ..Default::default()
        };

        let result = nelder_mead(|x| (x[0] - 5.0).powi(2), &[0.0], None, config);

        assert!(result.timed_out());
        assert!(!result.converged());
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn empty_problem() {
        let result = nelder_mead(|_| 0.0, &[], None, NelderMeadConfig::default());
        assert_eq!(result.stop, StopReason::EmptyProblem);
        assert!(result.value.is_nan());
    }
}
