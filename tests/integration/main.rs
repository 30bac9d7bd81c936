//! Integration tests for swapplan.
//!
//! These run the built binary, but never a real `apply`: every run either
//! stops before changing anything or is a dry run against temporary files.

mod util;

mod arg_tests;
mod invalid_config_tests;
mod valid_config_tests;
