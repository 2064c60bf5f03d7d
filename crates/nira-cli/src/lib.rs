//! Library surface of the `nira` binary, split out so the argument
//! parsing and the driver sequence stay unit-testable.

pub mod cli;
pub mod driver;
