//! Construction of VM instruction sequences for the individual
//! pieces of a Jack class (subroutines, statements, expressions).

pub mod expression;
pub mod literal;
pub mod statement;
pub mod subroutine;
pub mod subroutine_call;
