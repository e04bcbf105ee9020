pub mod describe;
pub mod repl;
