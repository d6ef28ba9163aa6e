pub mod countdown;
pub mod format;
pub mod stopwatch;
