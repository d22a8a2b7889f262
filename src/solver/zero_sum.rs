use crate::solver::simplex::{LinearProgram, SolverError};

/// Optimal solution of a two-person zero-sum game.
///
/// The row player maximizes and the column player minimizes the payoff `P[i][j]`.
#[derive(Debug, Clone)]
pub struct ZeroSumGame {
    value: f64,
    row_strategy: Vec<f64>,
    column_strategy: Vec<f64>,
}

impl ZeroSumGame {
    /// Solve the game with payoff matrix `payoff` (rows: maximizer, columns: minimizer)
    pub fn solve(payoff: &[Vec<f64>]) -> Result<Self, SolverError> {
        let m = payoff.len();
        let n = payoff.first().map(Vec::len).unwrap_or(0);
        if m == 0 || n == 0 {
            return Err(SolverError::DegenerateGame("Payoff matrix is empty".to_string()));
        }
        if payoff.iter().any(|row| row.len() != n) {
            return Err(SolverError::DegenerateGame("Payoff matrix is ragged".to_string()));
        }
        if payoff.iter().flatten().any(|v| !v.is_finite()) {
            return Err(SolverError::DegenerateGame(
                "Payoff matrix has non-finite entries".to_string(),
            ));
        }

        // Make every entry strictly positive so the game value is positive
        let min = payoff.iter().flatten().copied().fold(f64::INFINITY, f64::min);
        let shift = if min <= 0.0 { -min + 1.0 } else { 0.0 };
        let shifted: Vec<Vec<f64>> = payoff
            .iter()
            .map(|row| row.iter().map(|v| v + shift).collect())
            .collect();

        let lp = LinearProgram::solve(&shifted, &vec![1.0; m], &vec![1.0; n]).map_err(|e| match e {
            err @ SolverError::DegenerateGame(_) => err,
            other => SolverError::DegenerateGame(other.to_string()),
        })?;

        let column_strategy = normalize(lp.primal())?;
        let row_strategy = normalize(lp.dual())?;
        let scale: f64 = lp.primal().iter().sum();

        Ok(ZeroSumGame {
            value: 1.0 / scale - shift,
            row_strategy,
            column_strategy,
        })
    }

    /// Expected payoff to the row player under optimal play
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Optimal mixed strategy of the row (maximizing) player
    pub fn row_strategy(&self) -> &[f64] {
        &self.row_strategy
    }

    /// Optimal mixed strategy of the column (minimizing) player
    pub fn column_strategy(&self) -> &[f64] {
        &self.column_strategy
    }
}

/// Scale a nonnegative LP solution into a probability distribution.
///
/// Round-off can leave entries like -0.0 or -1e-17, which are clamped to zero.
fn normalize(weights: Vec<f64>) -> Result<Vec<f64>, SolverError> {
    let clamped: Vec<f64> = weights.into_iter().map(|w| w.max(0.0)).collect();
    let total: f64 = clamped.iter().sum();
    if !(total > 0.0) || !total.is_finite() {
        return Err(SolverError::DegenerateGame(
            "LP solution does not define a strategy".to_string(),
        ));
    }
    Ok(clamped.into_iter().map(|w| w / total).collect())
}
