pub mod cli;
pub mod coverage;
pub mod diff;
pub mod error;
pub mod evaluate;
pub mod filter;
pub mod model;
pub mod report;
pub mod threshold;
