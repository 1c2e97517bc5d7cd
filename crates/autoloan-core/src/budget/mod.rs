pub mod solver;

#[cfg(feature = "background")]
pub mod background;

pub use solver::{
    solve_budget, solve_budget_cancellable, solve_budget_with_tables, BudgetInput, BudgetSolution,
    CancelToken, SearchStrategy, SolverConfig, TargetKind,
};

#[cfg(feature = "background")]
pub use background::{BudgetSession, SessionResult};
