//! MILP model state

use std::fmt;

use good_lp::{Expression, ProblemVariables, Variable, variable};
use num_traits::ToPrimitive;

use crate::solvers::SolverError;

/// Relation operator for a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConstraintRelation {
    /// Less than or equal (`lhs <= rhs`)
    Leq,

    /// Greater than or equal (`lhs >= rhs`)
    Geq,
}

/// Recorded linear constraint emitted during model construction.
pub(crate) struct RecordedConstraint {
    /// Left-hand side expression
    pub(crate) lhs: Expression,

    /// Relation operator
    pub(crate) relation: ConstraintRelation,

    /// Right-hand side scalar
    pub(crate) rhs: f64,
}

/// Builder state for the MILP problem: variables, objective and constraints
/// are collected here, then applied to the backend model in one pass.
pub(crate) struct MilpState {
    pb: ProblemVariables,
    objective: Expression,
    constraints: Vec<RecordedConstraint>,
}

impl fmt::Debug for MilpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MilpState")
            .field("pb", &"<ProblemVariables>")
            .field("objective", &"<Expression>")
            .field(
                "constraints",
                &format!("[{} constraints]", self.constraints.len()),
            )
            .finish()
    }
}

impl MilpState {
    /// Creates an empty model state.
    pub(crate) fn new() -> Self {
        Self {
            pb: ProblemVariables::new(),
            objective: Expression::default(),
            constraints: Vec::new(),
        }
    }

    /// Adds an integer variable bounded to `0..=max`.
    pub(crate) fn add_quantity_var(&mut self, max: i64) -> Variable {
        self.pb.add(variable().integer().min(0).max(max as f64))
    }

    /// Adds a binary variable.
    pub(crate) fn add_binary_var(&mut self) -> Variable {
        self.pb.add(variable().binary())
    }

    /// Adds a binary selection variable linked two ways to a quantity
    /// variable: selected implies at least one serving, unselected forces
    /// zero servings.
    pub(crate) fn add_linked_selection(&mut self, quantity: Variable, max: i64) -> Variable {
        let selected = self.add_binary_var();

        // quantity >= selected: y = 1 forces x >= 1
        let mut lower = Expression::from(quantity);
        lower += selected * -1.0;
        self.add_geq(lower, 0.0);

        // quantity <= max * selected: y = 0 forces x = 0
        let mut upper = Expression::from(quantity);
        upper += selected * -(max as f64);
        self.add_leq(upper, 0.0);

        selected
    }

    /// Adds a binary variable equal to the conjunction of two binaries.
    pub(crate) fn add_conjunction(&mut self, a: Variable, b: Variable) -> Variable {
        let both = self.add_binary_var();

        // both <= a, both <= b, both >= a + b - 1
        let mut le_a = Expression::from(both);
        le_a += a * -1.0;
        self.add_leq(le_a, 0.0);

        let mut le_b = Expression::from(both);
        le_b += b * -1.0;
        self.add_leq(le_b, 0.0);

        let mut ge_and = Expression::from(both);
        ge_and += a * -1.0;
        ge_and += b * -1.0;
        self.add_geq(ge_and, -1.0);

        both
    }

    /// Adds a term to the minimisation objective.
    pub(crate) fn add_objective_term(&mut self, var: Variable, coefficient: f64) {
        self.objective += var * coefficient;
    }

    /// Records a less-than-or-equal constraint.
    pub(crate) fn add_leq(&mut self, lhs: Expression, rhs: f64) {
        self.constraints.push(RecordedConstraint {
            lhs,
            relation: ConstraintRelation::Leq,
            rhs,
        });
    }

    /// Records a greater-than-or-equal constraint.
    pub(crate) fn add_geq(&mut self, lhs: Expression, rhs: f64) {
        self.constraints.push(RecordedConstraint {
            lhs,
            relation: ConstraintRelation::Geq,
            rhs,
        });
    }

    /// Number of recorded constraints.
    pub(crate) fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Extracts the problem variables, objective and recorded constraints.
    pub(crate) fn into_parts(self) -> (ProblemVariables, Expression, Vec<RecordedConstraint>) {
        (self.pb, self.objective, self.constraints)
    }
}

/// Convert an `i64` to an `f64` if it can be represented exactly.
///
/// `good_lp` stores coefficients as `f64`; only integers with absolute value
/// <= 2^53 survive the round trip, and a silently rounded coefficient would
/// silently change the objective.
pub(crate) fn i64_to_f64_exact(v: i64) -> Option<f64> {
    let f = v.to_f64()?;

    (f.to_i64() == Some(v)).then_some(f)
}

/// Convert a cent or load amount into an exact solver coefficient.
pub(crate) fn coefficient(amount: i64) -> Result<f64, SolverError> {
    i64_to_f64_exact(amount).ok_or(SolverError::CoefficientNotRepresentable { amount })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use good_lp::Solution;

    use super::*;

    #[test]
    #[expect(
        clippy::cast_precision_loss,
        reason = "This is a test case for exact conversion"
    )]
    fn i64_to_f64_exact_accepts_exactly_representable_integers() {
        let cases: [i64; 5] = [0, 1, -1, 123, 9_007_199_254_740_992]; // 2^53

        for v in cases {
            assert_eq!(i64_to_f64_exact(v), Some(v as f64));
        }
    }

    #[test]
    fn i64_to_f64_exact_rejects_nonrepresentable_integers() {
        let cases: [i64; 2] = [9_007_199_254_740_993, -9_007_199_254_740_993]; // 2^53 + 1

        for v in cases {
            assert_eq!(i64_to_f64_exact(v), None);
        }
    }

    #[test]
    fn linked_selection_records_both_directions() {
        let mut state = MilpState::new();
        let quantity = state.add_quantity_var(10);
        let selected = state.add_linked_selection(quantity, 10);

        assert_eq!(state.constraint_count(), 2);

        let (_, _, constraints) = state.into_parts();

        // y = 1, x = 3 satisfies both recorded constraints
        let values: HashMap<Variable, f64> = [(quantity, 3.0), (selected, 1.0)].into();
        let lower = values.eval(&constraints[0].lhs);
        let upper = values.eval(&constraints[1].lhs);

        assert!(lower >= constraints[0].rhs);
        assert!(upper <= constraints[1].rhs);

        // y = 0, x = 3 violates the forcing constraint
        let values: HashMap<Variable, f64> = [(quantity, 3.0), (selected, 0.0)].into();
        let upper = values.eval(&constraints[1].lhs);

        assert!(upper > constraints[1].rhs);
    }

    #[test]
    fn conjunction_is_tight_for_all_binary_points() {
        let mut state = MilpState::new();
        let a = state.add_binary_var();
        let b = state.add_binary_var();
        let both = state.add_conjunction(a, b);

        let (_, _, constraints) = state.into_parts();

        for (a_val, b_val) in [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)] {
            let expected = if a_val > 0.5 && b_val > 0.5 { 1.0 } else { 0.0 };
            let values: HashMap<Variable, f64> =
                [(a, a_val), (b, b_val), (both, expected)].into();

            for constraint in &constraints {
                let lhs = values.eval(&constraint.lhs);

                match constraint.relation {
                    ConstraintRelation::Leq => assert!(lhs <= constraint.rhs + 1e-9),
                    ConstraintRelation::Geq => assert!(lhs >= constraint.rhs - 1e-9),
                }
            }
        }
    }
}
