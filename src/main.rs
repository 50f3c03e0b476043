//! wav-probe - 主程序入口
//!
//! 纯流程控制器，负责协调各个工具模块完成WAV解码探测任务。

use pcm_wav_reader::{
    error::AudioError,
    tools::{self, AppConfig},
};
use std::process;

/// 错误退出码定义
mod exit_codes {
    /// I/O错误
    pub const IO_ERROR: i32 = 1;
    /// 参数/头部/格式错误
    pub const FORMAT_ERROR: i32 = 2;
    /// 内存错误
    pub const MEMORY_ERROR: i32 = 4;
}

fn exit_code_for(error: &AudioError) -> i32 {
    match error {
        AudioError::IoError(_) => exit_codes::IO_ERROR,
        AudioError::InvalidArgument(_)
        | AudioError::MalformedHeader(_)
        | AudioError::UnsupportedFormat(_) => exit_codes::FORMAT_ERROR,
        AudioError::OutOfMemory { .. } => exit_codes::MEMORY_ERROR,
    }
}

/// 获取错误建议文本
fn get_error_suggestion(error: &AudioError) -> &'static str {
    match error {
        AudioError::InvalidArgument(_) => {
            "检查命令行参数是否正确，使用 --help 查看完整用法 / Check command-line arguments, use --help to see full usage"
        }
        AudioError::IoError(_) => {
            "检查文件路径是否正确，文件是否存在且可读 / Check if file path is correct, file exists and is readable"
        }
        AudioError::MalformedHeader(_) => {
            "文件可能损坏或不是WAV文件 / File may be corrupted or is not a WAV file"
        }
        AudioError::UnsupportedFormat(_) => {
            "仅支持16/32位整数PCM与32位浮点；--bits 16 仅支持16位PCM / Only 16/32-bit PCM and 32-bit float are supported; --bits 16 accepts 16-bit PCM only"
        }
        AudioError::OutOfMemory { .. } => {
            "内存不足，尝试提高 --max-buffer-mb 或降低并发度（-j 1） / Out of memory, raise --max-buffer-mb or reduce parallelism (-j 1)"
        }
    }
}

/// 错误处理和建议
fn handle_error(error: AudioError) -> ! {
    eprintln!("[ERROR] 错误 / Error: {error}");
    eprintln!("[INFO] 建议 / Suggestion: {}", get_error_suggestion(&error));
    process::exit(exit_code_for(&error));
}

fn init_logging(config: &AppConfig) {
    let default_filter = if config.verbose { "debug" } else { "warn" };
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter),
    );
    if config.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

/// 应用程序主逻辑
///
/// 所有文件都会被处理并输出；存在失败文件时以第一个失败的错误类别退出。
fn run() -> Result<(), AudioError> {
    let config = tools::parse_args()?;
    init_logging(&config);

    let wav_files = tools::scan_wav_files(&config.inputs, config.recursive)?;
    if wav_files.is_empty() {
        eprintln!("[WARNING] 未找到WAV文件 / No WAV files found");
        return Ok(());
    }
    log::info!("共找到 {} 个WAV文件", wav_files.len());

    let mut outcomes = tools::probe_files(&wav_files, &config);

    let output = if config.json {
        tools::render_json(&outcomes)?
    } else {
        tools::render_table(&outcomes)
    };
    println!("{output}");

    let first_failure = outcomes
        .iter()
        .position(|outcome| outcome.result.is_err())
        .map(|index| outcomes.swap_remove(index).result);
    match first_failure {
        Some(Err(error)) => Err(error),
        _ => Ok(()),
    }
}

fn main() {
    if let Err(error) = run() {
        handle_error(error);
    }
}
