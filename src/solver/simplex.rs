//! Tableau simplex for `maximize cᵀx subject to Ax <= b, x >= 0` with `b >= 0`.
//!
//! The slack basis is feasible from the start because `b` is nonnegative, so no phase one
//! is needed. Pivoting follows Bland's rule (smallest entering index, smallest leaving basis
//! variable on ratio ties), which rules out cycling on degenerate programs.

use thiserror::Error;

const EPSILON: f64 = 1.0e-10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Degenerate game: {0}")]
    DegenerateGame(String),
    #[error("Linear program is unbounded")]
    Unbounded,
    #[error("Linear program is infeasible: {0}")]
    Infeasible(String),
}

/// A solved linear program
#[derive(Debug, Clone)]
pub struct LinearProgram {
    // (m + 1) x (n + m + 1): constraint rows, then the objective row
    tableau: Vec<Vec<f64>>,
    basis: Vec<usize>,
    m: usize,
    n: usize,
}

impl LinearProgram {
    /// Solve `maximize cᵀx` subject to `Ax <= b`, `x >= 0`
    pub fn solve(a: &[Vec<f64>], b: &[f64], c: &[f64]) -> Result<Self, SolverError> {
        let m = b.len();
        let n = c.len();
        if a.len() != m || a.iter().any(|row| row.len() != n) {
            return Err(SolverError::DegenerateGame(format!(
                "Constraint matrix must be {}x{}",
                m, n
            )));
        }
        let all_finite = a.iter().flatten().chain(b).chain(c).all(|v| v.is_finite());
        if !all_finite {
            return Err(SolverError::DegenerateGame(
                "Linear program has non-finite coefficients".to_string(),
            ));
        }
        if let Some(i) = b.iter().position(|&v| v < 0.0) {
            return Err(SolverError::Infeasible(format!(
                "RHS must be nonnegative, found b[{}] = {}",
                i, b[i]
            )));
        }

        let mut tableau = vec![vec![0.0; n + m + 1]; m + 1];
        for i in 0..m {
            tableau[i][..n].copy_from_slice(&a[i]);
            tableau[i][n + i] = 1.0;
            tableau[i][m + n] = b[i];
        }
        tableau[m][..n].copy_from_slice(c);

        let mut lp = LinearProgram {
            tableau,
            basis: (n..n + m).collect(),
            m,
            n,
        };
        lp.run()?;
        Ok(lp)
    }

    fn run(&mut self) -> Result<(), SolverError> {
        while let Some(q) = self.entering_column() {
            let p = self.leaving_row(q).ok_or(SolverError::Unbounded)?;
            self.pivot(p, q);
            self.basis[p] = q;
        }
        Ok(())
    }

    /// Lowest index column with a positive reduced cost
    fn entering_column(&self) -> Option<usize> {
        (0..self.m + self.n).find(|&j| self.tableau[self.m][j] > EPSILON)
    }

    /// Minimum ratio test, ties broken by the smallest basis variable
    fn leaving_row(&self, q: usize) -> Option<usize> {
        let rhs = self.m + self.n;
        let mut best: Option<usize> = None;
        for i in 0..self.m {
            if self.tableau[i][q] <= EPSILON {
                continue;
            }
            best = match best {
                None => Some(i),
                Some(p) => {
                    let ratio = self.tableau[i][rhs] / self.tableau[i][q];
                    let best_ratio = self.tableau[p][rhs] / self.tableau[p][q];
                    if ratio < best_ratio || (ratio == best_ratio && self.basis[i] < self.basis[p]) {
                        Some(i)
                    } else {
                        Some(p)
                    }
                }
            };
        }
        best
    }

    /// Gauss-Jordan pivot on entry (p, q)
    fn pivot(&mut self, p: usize, q: usize) {
        let width = self.m + self.n + 1;
        let pivot = self.tableau[p][q];
        let pivot_row = self.tableau[p].clone();

        for (i, row) in self.tableau.iter_mut().enumerate() {
            if i == p {
                continue;
            }
            let factor = row[q] / pivot;
            for j in 0..width {
                if j != q {
                    row[j] -= pivot_row[j] * factor;
                }
            }
            row[q] = 0.0;
        }

        for j in 0..width {
            if j != q {
                self.tableau[p][j] /= pivot;
            }
        }
        self.tableau[p][q] = 1.0;
    }

    /// Optimal objective value
    pub fn value(&self) -> f64 {
        -self.tableau[self.m][self.m + self.n]
    }

    /// Optimal primal solution `x`
    pub fn primal(&self) -> Vec<f64> {
        let mut x = vec![0.0; self.n];
        for (i, &var) in self.basis.iter().enumerate() {
            if var < self.n {
                x[var] = self.tableau[i][self.m + self.n];
            }
        }
        x
    }

    /// Optimal dual solution `y`, one entry per constraint
    pub fn dual(&self) -> Vec<f64> {
        (0..self.m).map(|i| -self.tableau[self.m][self.n + i]).collect()
    }
}
