pub mod statement;

pub use statement::{
    Assignment, Clause, CqlStatement, Delete, Insert, Select, SelectBase, Statement, Update,
};
