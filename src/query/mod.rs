pub mod compiler;
pub mod condition;
pub mod plan;
pub mod translator;

pub use compiler::{CompiledCondition, compile_condition};
pub use translator::translate;
