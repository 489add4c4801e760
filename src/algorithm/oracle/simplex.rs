//! # An exact simplex oracle
//!
//! A dense two-phase primal simplex over arbitrary precision rationals, with Bland's rule for
//! termination. The LPs posed by the completion engine are small (the active rows of one
//! derivation), so a dense tableau is the robust choice; there is no floating point anywhere.
//!
//! Free variables are split into their positive and negative parts, inequality rows get a slack
//! column, and feasibility is established by minimizing the sum of artificial variables.
use num_traits::Zero;

use crate::algorithm::oracle::{LpOracle, SolveStatus};
use crate::data::certificate::elements::Objective;
use crate::data::linear_algebra::SparseVector;
use crate::data::number_types::Rational;

/// A stored row: rational coefficients with at most one finite side pair.
#[derive(Clone, Debug)]
struct Row {
    coefficients: SparseVector,
    lower: Option<Rational>,
    upper: Option<Rational>,
}

/// The built-in implementation of the `LpOracle` seam.
#[derive(Clone, Debug)]
pub struct SimplexOracle {
    columns: usize,
    rows: Vec<Row>,
    objective: SparseVector,
    direction: Objective,

    /// Duals, Farkas multipliers and reduced costs of the most recent solve.
    duals: Vec<Rational>,
    farkas: Vec<Rational>,
    reduced: Vec<Rational>,
}

impl SimplexOracle {
    pub fn new() -> Self {
        Self {
            columns: 0,
            rows: Vec::new(),
            objective: SparseVector::empty(),
            direction: Objective::Minimize,
            duals: Vec::new(),
            farkas: Vec::new(),
            reduced: Vec::new(),
        }
    }
}

impl Default for SimplexOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl LpOracle for SimplexOracle {
    fn add_columns(&mut self, count: usize) {
        self.columns += count;
    }

    fn add_row(
        &mut self,
        coefficients: &SparseVector,
        lower: Option<Rational>,
        upper: Option<Rational>,
    ) {
        debug_assert!(lower.is_some() || upper.is_some());
        debug_assert!(match (&lower, &upper) {
            (Some(lower), Some(upper)) => lower == upper,
            _ => true,
        });

        self.rows.push(Row { coefficients: coefficients.clone(), lower, upper });
    }

    fn remove_rows(&mut self, indices: &[usize]) {
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]));

        for &index in indices.iter().rev() {
            self.rows.remove(index);
        }
    }

    fn set_objective(&mut self, coefficients: &SparseVector, direction: Objective) {
        self.objective = coefficients.clone();
        self.direction = direction;
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn solve(&mut self) -> SolveStatus {
        let standard = StandardForm::new(self);
        standard.solve(self)
    }

    fn dual_values(&self) -> Vec<Rational> {
        self.duals.clone()
    }

    fn farkas_multipliers(&self) -> Vec<Rational> {
        self.farkas.clone()
    }

    fn reduced_costs(&self) -> Vec<Rational> {
        self.reduced.clone()
    }
}

/// The equality-form tableau the simplex iterations run on.
///
/// Column layout: positive variable parts, negative variable parts, one slack per row (zero
/// column for equality rows), one artificial per row. Right hand sides are made nonnegative by
/// row negation, recorded in `row_signs`.
struct StandardForm {
    tableau: Vec<Vec<Rational>>,
    basis: Vec<usize>,
    /// Phase two costs: the (possibly negated for maximization) user objective on the variable
    /// parts, zero elsewhere.
    costs: Vec<Rational>,
    row_signs: Vec<i8>,
    variables: usize,
    total_columns: usize,
    artificial_offset: usize,
}

enum PhaseResult {
    Optimal,
    Unbounded,
}

impl StandardForm {
    fn new(oracle: &SimplexOracle) -> Self {
        let n = oracle.columns;
        let m = oracle.rows.len();
        let slack_offset = 2 * n;
        let artificial_offset = slack_offset + m;
        let total_columns = artificial_offset + m;

        // Minimization costs on the split variable parts.
        let mut costs = vec![Rational::zero(); total_columns];
        for (index, value) in oracle.objective.iter() {
            let value = match oracle.direction {
                Objective::Minimize => value.clone(),
                Objective::Maximize => -value,
            };
            costs[*index] = value.clone();
            costs[n + *index] = -value;
        }

        let mut tableau = Vec::with_capacity(m);
        let mut row_signs = Vec::with_capacity(m);
        for (i, row) in oracle.rows.iter().enumerate() {
            // Slack sign and right hand side per row type.
            let (slack, rhs) = match (&row.lower, &row.upper) {
                (Some(lower), Some(_)) => (0, lower.clone()),
                (None, Some(upper)) => (1, upper.clone()),
                (Some(lower), None) => (-1, lower.clone()),
                (None, None) => (0, Rational::zero()),
            };
            let sign = if rhs.is_negative() { -1 } else { 1 };
            let factor = Rational::from_integer(sign as i64);

            let mut entries = vec![Rational::zero(); total_columns + 1];
            for (index, value) in row.coefficients.iter() {
                let value = &factor * value;
                entries[*index] = value.clone();
                entries[n + *index] = -value;
            }
            if slack != 0 {
                entries[slack_offset + i] = Rational::from_integer((slack * sign) as i64);
            }
            entries[artificial_offset + i] = Rational::from_integer(1);
            entries[total_columns] = &factor * &rhs;

            tableau.push(entries);
            row_signs.push(sign as i8);
        }

        let basis = (0..m).map(|i| artificial_offset + i).collect();

        Self {
            tableau,
            basis,
            costs,
            row_signs,
            variables: n,
            total_columns,
            artificial_offset,
        }
    }

    /// Run both phases and write the duals, Farkas multipliers and reduced costs back into the
    /// oracle.
    fn solve(mut self, oracle: &mut SimplexOracle) -> SolveStatus {
        oracle.duals.clear();
        oracle.farkas.clear();
        oracle.reduced.clear();

        let mut phase_one_costs = vec![Rational::zero(); self.total_columns];
        for j in self.artificial_offset..self.total_columns {
            phase_one_costs[j] = Rational::from_integer(1);
        }

        match self.run_phase(&phase_one_costs, self.total_columns) {
            PhaseResult::Optimal => {}
            // Phase one is bounded below by zero; this cannot happen.
            PhaseResult::Unbounded => return SolveStatus::Other,
        }

        let artificial_value = self.objective_value(&phase_one_costs);
        if artificial_value.is_positive() {
            // No feasible point: the phase one duals certify it.
            oracle.farkas = self.duals_from(&phase_one_costs);
            return SolveStatus::Infeasible;
        }

        let costs = self.costs.clone();
        // Artificials stay out of the basis from here on.
        match self.run_phase(&costs, self.artificial_offset) {
            PhaseResult::Optimal => {
                let mut duals = self.duals_from(&costs);
                if oracle.direction == Objective::Maximize {
                    // The tableau minimized the negated objective; flip back to user space.
                    for value in &mut duals {
                        *value = -&*value;
                    }
                }
                let reduced = self.user_reduced_costs(oracle, &duals);
                oracle.reduced = reduced;
                oracle.duals = duals;
                SolveStatus::Optimal
            }
            PhaseResult::Unbounded => SolveStatus::Other,
        }
    }

    /// Iterate with Bland's rule until no entering column below `allowed_columns` remains, or
    /// unboundedness is detected.
    fn run_phase(&mut self, costs: &[Rational], allowed_columns: usize) -> PhaseResult {
        loop {
            let entering = (0..allowed_columns)
                .find(|&column| self.reduced_cost(costs, column).is_negative());
            let entering = match entering {
                None => return PhaseResult::Optimal,
                Some(column) => column,
            };

            // Minimum ratio, ties broken towards the smallest basis index.
            let mut leaving: Option<(usize, Rational)> = None;
            for row in 0..self.tableau.len() {
                let pivot = &self.tableau[row][entering];
                if !pivot.is_positive() {
                    continue;
                }
                let ratio = &self.tableau[row][self.total_columns] / pivot;
                let better = match &leaving {
                    None => true,
                    Some((current, best)) => {
                        &ratio < best || (&ratio == best && self.basis[row] < self.basis[*current])
                    }
                };
                if better {
                    leaving = Some((row, ratio));
                }
            }

            match leaving {
                None => return PhaseResult::Unbounded,
                Some((row, _)) => self.pivot(row, entering),
            }
        }
    }

    fn reduced_cost(&self, costs: &[Rational], column: usize) -> Rational {
        let mut value = costs[column].clone();
        for (row, entries) in self.tableau.iter().enumerate() {
            let basic_cost = &costs[self.basis[row]];
            if !basic_cost.is_zero() && !entries[column].is_zero() {
                value -= basic_cost * &entries[column];
            }
        }
        value
    }

    fn objective_value(&self, costs: &[Rational]) -> Rational {
        let mut value = Rational::zero();
        for (row, entries) in self.tableau.iter().enumerate() {
            let basic_cost = &costs[self.basis[row]];
            if !basic_cost.is_zero() {
                value += basic_cost * &entries[self.total_columns];
            }
        }
        value
    }

    fn pivot(&mut self, row: usize, column: usize) {
        let pivot = self.tableau[row][column].clone();
        for value in &mut self.tableau[row] {
            if !value.is_zero() {
                *value = &*value / &pivot;
            }
        }

        for other in 0..self.tableau.len() {
            if other == row {
                continue;
            }
            let factor = self.tableau[other][column].clone();
            if factor.is_zero() {
                continue;
            }
            for index in 0..=self.total_columns {
                let update = &factor * &self.tableau[row][index];
                if !update.is_zero() {
                    self.tableau[other][index] -= update;
                }
            }
        }

        self.basis[row] = column;
    }

    /// Duals in user row space: `y = c_B B^{-1}`, read off under the artificial columns (which
    /// hold `B^{-1}`), undoing the row negations and the maximization flip.
    fn duals_from(&self, costs: &[Rational]) -> Vec<Rational> {
        let m = self.tableau.len();
        let mut duals = Vec::with_capacity(m);
        for i in 0..m {
            let mut value = Rational::zero();
            for (row, entries) in self.tableau.iter().enumerate() {
                let basic_cost = &costs[self.basis[row]];
                if !basic_cost.is_zero() {
                    value += basic_cost * &entries[self.artificial_offset + i];
                }
            }
            if self.row_signs[i] < 0 {
                value = -value;
            }
            duals.push(value);
        }
        duals
    }

    /// Reduced costs of the original free columns: the user objective priced out against the
    /// user space duals. Free columns price out to exactly zero at an optimum.
    fn user_reduced_costs(&self, oracle: &SimplexOracle, duals: &[Rational]) -> Vec<Rational> {
        let mut reduced = Vec::with_capacity(self.variables);
        for j in 0..self.variables {
            let mut value = oracle.objective.value_at(j);
            for (i, row) in oracle.rows.iter().enumerate() {
                if let Some(coefficient) = row.coefficients.get(j) {
                    value -= &duals[i] * coefficient;
                }
            }
            reduced.push(value);
        }
        reduced
    }
}

#[cfg(test)]
mod test {
    use num_traits::Zero;

    use crate::algorithm::oracle::{LpOracle, SimplexOracle, SolveStatus};
    use crate::data::certificate::elements::Objective;
    use crate::data::linear_algebra::SparseVector;
    use crate::data::number_types::Rational;
    use crate::R;

    fn vector(pairs: &[(usize, i64)]) -> SparseVector {
        SparseVector::new(pairs.iter().map(|&(i, v)| (i, R!(v))).collect())
    }

    #[test]
    fn minimize_with_duals() {
        // min x + y  s.t.  4x + y >= 1,  4x - y <= 2,  y >= -1/2,  y >= 0.
        let mut oracle = SimplexOracle::new();
        oracle.add_columns(2);
        oracle.add_row(&vector(&[(0, 4), (1, 1)]), Some(R!(1)), None);
        oracle.add_row(&vector(&[(0, 4), (1, -1)]), None, Some(R!(2)));
        oracle.add_row(&vector(&[(1, 1)]), Some(R!(-1, 2)), None);
        oracle.add_row(&vector(&[(1, 1)]), Some(R!(0)), None);
        oracle.set_objective(&vector(&[(0, 1), (1, 1)]), Objective::Minimize);

        assert_eq!(oracle.solve(), SolveStatus::Optimal);

        // Any optimal dual must price out the objective exactly, respect the row senses and
        // realize the optimal value 1/4.
        let duals = oracle.dual_values();
        assert_eq!(&duals[0] * &R!(4) + &duals[1] * &R!(4), R!(1));
        assert_eq!(&duals[0] - &duals[1] + &duals[2] + &duals[3], R!(1));
        assert!(!duals[0].is_negative() && !duals[2].is_negative() && !duals[3].is_negative());
        assert!(!duals[1].is_positive());
        let value = &duals[0] * &R!(1) + &duals[1] * &R!(2) + &duals[2] * &R!(-1, 2);
        assert_eq!(value, R!(1, 4));
        assert!(oracle.reduced_costs().iter().all(Rational::is_zero));
    }

    #[test]
    fn maximize_bounds_from_above() {
        // max x  s.t.  x <= 5: the dual aggregates to x <= 5.
        let mut oracle = SimplexOracle::new();
        oracle.add_columns(1);
        oracle.add_row(&vector(&[(0, 1)]), None, Some(R!(5)));
        oracle.set_objective(&vector(&[(0, 1)]), Objective::Maximize);

        assert_eq!(oracle.solve(), SolveStatus::Optimal);
        assert_eq!(oracle.dual_values(), vec![R!(1)]);
        assert_eq!(oracle.reduced_costs(), vec![R!(0)]);
    }

    #[test]
    fn farkas_certificate() {
        // x >= 1 and x <= 0 cannot both hold.
        let mut oracle = SimplexOracle::new();
        oracle.add_columns(1);
        oracle.add_row(&vector(&[(0, 1)]), Some(R!(1)), None);
        oracle.add_row(&vector(&[(0, 1)]), None, Some(R!(0)));
        oracle.set_objective(&vector(&[(0, 1)]), Objective::Minimize);

        assert_eq!(oracle.solve(), SolveStatus::Infeasible);

        let farkas = oracle.farkas_multipliers();
        // Sign conventions: nonnegative on the >= row, nonpositive on the <= row, and the
        // aggregated constraint is a falsehood: coefficients cancel, right hand side positive.
        assert!(farkas[0].is_positive());
        assert!(!farkas[1].is_positive());
        assert_eq!(&farkas[0] + &farkas[1], R!(0));
        assert!((&farkas[0] * &R!(1) + &farkas[1] * &R!(0)).is_positive());
    }

    #[test]
    fn unbounded_is_not_terminal() {
        let mut oracle = SimplexOracle::new();
        oracle.add_columns(1);
        oracle.set_objective(&vector(&[(0, 1)]), Objective::Minimize);

        assert_eq!(oracle.solve(), SolveStatus::Other);
    }

    #[test]
    fn equality_rows() {
        // min y  s.t.  x + y = 3,  x <= 2: optimum 1 with duals (1, -1).
        let mut oracle = SimplexOracle::new();
        oracle.add_columns(2);
        oracle.add_row(&vector(&[(0, 1), (1, 1)]), Some(R!(3)), Some(R!(3)));
        oracle.add_row(&vector(&[(0, 1)]), None, Some(R!(2)));
        oracle.set_objective(&vector(&[(1, 1)]), Objective::Minimize);

        assert_eq!(oracle.solve(), SolveStatus::Optimal);
        assert_eq!(oracle.dual_values(), vec![R!(1), R!(-1)]);
    }

    #[test]
    fn row_removal_shifts_positions() {
        let mut oracle = SimplexOracle::new();
        oracle.add_columns(1);
        oracle.add_row(&vector(&[(0, 1)]), Some(R!(1)), None);
        oracle.add_row(&vector(&[(0, 1)]), None, Some(R!(0)));
        oracle.add_row(&vector(&[(0, 1)]), None, Some(R!(7)));
        oracle.remove_rows(&[1]);
        oracle.set_objective(&vector(&[(0, 1)]), Objective::Minimize);

        // With the contradicting middle row gone this is feasible again.
        assert_eq!(oracle.row_count(), 2);
        assert_eq!(oracle.solve(), SolveStatus::Optimal);
        assert_eq!(oracle.dual_values(), vec![R!(1), R!(0)]);
    }

    #[test]
    fn negative_right_hand_sides() {
        // min x  s.t.  x >= -3 (stored with a negative rhs, exercising row negation).
        let mut oracle = SimplexOracle::new();
        oracle.add_columns(1);
        oracle.add_row(&vector(&[(0, 1)]), Some(R!(-3)), None);
        oracle.set_objective(&vector(&[(0, 1)]), Objective::Minimize);

        assert_eq!(oracle.solve(), SolveStatus::Optimal);
        assert_eq!(oracle.dual_values(), vec![R!(1)]);
    }
}
