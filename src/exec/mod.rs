pub mod process;

pub use process::{ExecResult, run_program};
