pub mod depth;
pub mod error;
pub mod executor;

pub use depth::DepthTracker;
pub use error::{DiagnosticError, RuntimeError};
pub use executor::{
    ExecutionOptions, ExecutionReport, Executor, execute_program, execute_program_with,
};
