//! Exit codes of the chartify binary
//!
//! Usage errors follow the sysexits.h convention.

#![allow(dead_code)]

/// Chart written
pub const SUCCESS: i32 = 0;

/// Unspecified failure, including cluster access errors
pub const ERROR: i32 = 1;

/// Invalid manifest or chart directory
pub const CHART_ERROR: i32 = 4;

/// File not found, permission denied
pub const IO_ERROR: i32 = 5;

/// Invalid arguments or no object given
pub const USAGE_ERROR: i32 = 64;
