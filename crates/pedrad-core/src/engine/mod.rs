pub mod experiment;
pub mod runner;
