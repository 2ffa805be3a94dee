//! Exit codes for the CLI

/// Success
pub const SUCCESS: i32 = 0;

/// Missing artifact, authentication failure, or publish failure
pub const ERROR: i32 = 1;
