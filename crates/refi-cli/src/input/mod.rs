pub mod factors;
pub mod file;
pub mod stdin;
