//! 工具模块集合
//!
//! 包含CLI、文件扫描、批量解码、格式化等工具模块，支持main.rs的流程控制。

pub mod cli;
pub mod constants;
pub mod formatter;
pub mod processor;
pub mod scanner;
pub mod utils;

// 重新导出主要的公共接口
pub use cli::{AppConfig, ChannelMapArgs, OutputBits, parse_args};
pub use formatter::{count_outcomes, render_json, render_table};
pub use processor::{FileOutcome, FileReport, probe_file, probe_files};
pub use scanner::{scan_directory, scan_wav_files};
pub use utils::{audio, path};
