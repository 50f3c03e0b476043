//! 命令行接口模块
//!
//! 负责命令行参数解析与配置构建。

use crate::audio::wav_decoder::DEFAULT_MAX_BUFFER_BYTES;
use crate::error::{self, AudioResult};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use std::path::PathBuf;

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// 解码输出位宽（选择窄解码或宽解码入口）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputBits {
    Sixteen,
    ThirtyTwo,
}

impl OutputBits {
    pub fn bits(self) -> u8 {
        match self {
            OutputBits::Sixteen => 16,
            OutputBits::ThirtyTwo => 32,
        }
    }
}

/// 声道映射参数（原始字符串，按每个文件的声道数解析）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMapArgs {
    pub sources: String,
    pub gains_db: String,
}

/// 应用程序配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 输入文件或目录
    pub inputs: Vec<PathBuf>,

    /// 目录是否递归扫描
    pub recursive: bool,

    pub output_bits: OutputBits,

    /// 以JSON输出（默认表格）
    pub json: bool,

    /// 单个文件输出缓冲区上限（字节）
    pub max_buffer_bytes: u64,

    /// 并行解码的文件数
    pub jobs: usize,

    pub channel_map: Option<ChannelMapArgs>,

    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            recursive: false,
            output_bits: OutputBits::ThirtyTwo,
            json: false,
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
            jobs: 1,
            channel_map: None,
            verbose: false,
        }
    }
}

/// 构建clap命令定义
pub fn build_command() -> Command {
    Command::new("wav-probe")
        .version(VERSION)
        .about(DESCRIPTION)
        .arg(
            Arg::new("INPUT")
                .help("WAV文件或目录路径")
                .required(true)
                .num_args(1..)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("recursive")
                .long("recursive")
                .short('r')
                .help("递归扫描子目录")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("bits")
                .long("bits")
                .help("输出样本位宽：16仅接受16位PCM，32接受全部支持的编码")
                .value_parser(["16", "32"])
                .default_value("32"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("以JSON格式输出结果")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-buffer-mb")
                .long("max-buffer-mb")
                .help("单个文件样本缓冲区上限（MiB）")
                .value_parser(value_parser!(u64).range(1..))
                .default_value("1024"),
        )
        .arg(
            Arg::new("jobs")
                .long("jobs")
                .short('j')
                .help("并行解码的文件数")
                .value_parser(value_parser!(usize))
                .default_value("1"),
        )
        .arg(
            Arg::new("channel-map")
                .long("channel-map")
                .help("逗号分隔的声道源（从1开始，0为静音），例如 \"2,1\"")
                .value_name("SOURCES"),
        )
        .arg(
            Arg::new("gains-db")
                .long("gains-db")
                .help("逗号分隔的逐声道增益（dB），需配合 --channel-map")
                .value_name("GAINS")
                .allow_hyphen_values(true)
                .requires("channel-map"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("显示详细处理信息（debug日志）")
                .action(ArgAction::SetTrue),
        )
}

/// 从解析结果构建配置
pub fn config_from_matches(matches: &ArgMatches) -> AudioResult<AppConfig> {
    let inputs: Vec<PathBuf> = matches
        .get_many::<PathBuf>("INPUT")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    if inputs.is_empty() {
        return Err(error::invalid_argument("输入路径", "至少需要一个"));
    }

    let output_bits = match matches.get_one::<String>("bits").map(String::as_str) {
        Some("16") => OutputBits::Sixteen,
        _ => OutputBits::ThirtyTwo,
    };

    let max_buffer_mb = matches
        .get_one::<u64>("max-buffer-mb")
        .copied()
        .unwrap_or(DEFAULT_MAX_BUFFER_BYTES >> 20);

    let jobs = matches.get_one::<usize>("jobs").copied().unwrap_or(1);
    if jobs == 0 {
        return Err(error::invalid_argument("--jobs", "必须大于0"));
    }

    let channel_map = matches
        .get_one::<String>("channel-map")
        .map(|sources| ChannelMapArgs {
            sources: sources.clone(),
            gains_db: matches
                .get_one::<String>("gains-db")
                .cloned()
                .unwrap_or_default(),
        });

    Ok(AppConfig {
        inputs,
        recursive: matches.get_flag("recursive"),
        output_bits,
        json: matches.get_flag("json"),
        max_buffer_bytes: max_buffer_mb.saturating_mul(1024 * 1024),
        jobs,
        channel_map,
        verbose: matches.get_flag("verbose"),
    })
}

/// 解析命令行参数并创建配置
pub fn parse_args() -> AudioResult<AppConfig> {
    config_from_matches(&build_command().get_matches())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> AudioResult<AppConfig> {
        let matches = build_command()
            .try_get_matches_from(args.iter().copied())
            .map_err(|e| error::invalid_argument("命令行", e))?;
        config_from_matches(&matches)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["wav-probe", "a.wav"]).unwrap();
        assert_eq!(config.inputs, vec![PathBuf::from("a.wav")]);
        assert_eq!(config.output_bits, OutputBits::ThirtyTwo);
        assert_eq!(config.max_buffer_bytes, DEFAULT_MAX_BUFFER_BYTES);
        assert_eq!(config.jobs, 1);
        assert!(!config.json && !config.recursive && !config.verbose);
        assert!(config.channel_map.is_none());
    }

    #[test]
    fn test_all_flags() {
        let config = parse(&[
            "wav-probe",
            "a.wav",
            "dir",
            "-r",
            "--bits",
            "16",
            "--json",
            "--max-buffer-mb",
            "8",
            "-j",
            "4",
            "--channel-map",
            "2,1",
            "--gains-db",
            "-3,0",
            "-v",
        ])
        .unwrap();
        assert_eq!(config.inputs.len(), 2);
        assert!(config.recursive && config.json && config.verbose);
        assert_eq!(config.output_bits.bits(), 16);
        assert_eq!(config.max_buffer_bytes, 8 * 1024 * 1024);
        assert_eq!(config.jobs, 4);
        assert_eq!(
            config.channel_map,
            Some(ChannelMapArgs {
                sources: "2,1".to_string(),
                gains_db: "-3,0".to_string(),
            })
        );
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(parse(&["wav-probe"]).is_err());
        assert!(parse(&["wav-probe", "a.wav", "--bits", "24"]).is_err());
        assert!(parse(&["wav-probe", "a.wav", "-j", "0"]).is_err());
        assert!(parse(&["wav-probe", "a.wav", "--gains-db", "-3"]).is_err());
    }
}
