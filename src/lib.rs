pub mod cache;
pub mod config;
pub mod off;
pub mod output;
pub mod product;
pub mod scan;
pub mod scoring;
pub mod telemetry;

// Process exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_NOT_FOUND: i32 = 1;
pub const EXIT_NETWORK: i32 = 2;
pub const EXIT_INVALID_INPUT: i32 = 3;
pub const EXIT_CONFIG: i32 = 4;
