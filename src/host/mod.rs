//! 外部命令通道

pub mod stdio;

pub use stdio::{run_stdio_bridge, serve_lines};
