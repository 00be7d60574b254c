//! Command-line front ends built on the library.

pub mod run;
