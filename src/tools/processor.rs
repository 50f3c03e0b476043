//! 文件处理模块
//!
//! 对每个文件执行一次独立的解码会话，并汇总为报告。
//! 多文件时使用rayon线程池并行，每个会话拥有自己的字节源。

use super::cli::{AppConfig, OutputBits};
use super::utils;
use crate::audio::{DecodeOptions, DecodedWav, FileOpener, WavFileDecoder};
use crate::error::AudioResult;
use crate::processing::{ChannelMap, NormalizedSample, channel_peaks, to_normalized_f32};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// 单个文件的解码报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub path: String,
    pub num_channels: u16,
    pub sample_rate_hz: u32,
    pub sample_count: usize,
    pub num_frames: usize,
    pub duration_seconds: f64,
    /// 解码输出位宽
    pub output_bits: u8,
    /// 逐声道峰值（dBFS）；应用声道映射时为映射后的输出声道
    pub peak_dbfs: Vec<f64>,
}

/// 单个文件的处理结果（保留输入顺序）
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: AudioResult<FileReport>,
}

fn build_report<T: NormalizedSample>(
    path: &Path,
    decoded: &DecodedWav<T>,
    output_bits: OutputBits,
    config: &AppConfig,
) -> AudioResult<FileReport> {
    let num_channels = decoded.num_channels as usize;
    let normalized = to_normalized_f32(&decoded.samples);

    let peaks = match &config.channel_map {
        Some(args) => {
            let map = ChannelMap::parse(num_channels, &args.sources, &args.gains_db)?;
            log::debug!("{}: {map}", utils::extract_filename_lossy(path));
            let num_frames = decoded.num_frames();
            let mut mapped = vec![0.0f32; map.num_output_channels() * num_frames];
            map.apply(&normalized, num_frames, &mut mapped)?;
            channel_peaks(&mapped, map.num_output_channels())
        }
        None => channel_peaks(&normalized, num_channels),
    };

    Ok(FileReport {
        path: path.display().to_string(),
        num_channels: decoded.num_channels,
        sample_rate_hz: decoded.sample_rate_hz,
        sample_count: decoded.sample_count(),
        num_frames: decoded.num_frames(),
        duration_seconds: decoded.duration_seconds(),
        output_bits: output_bits.bits(),
        peak_dbfs: peaks
            .into_iter()
            .map(|peak| utils::linear_to_db(f64::from(peak)))
            .collect(),
    })
}

/// 解码单个文件并生成报告
pub fn probe_file(path: &Path, config: &AppConfig) -> AudioResult<FileReport> {
    let decoder = WavFileDecoder::with_options(
        DecodeOptions::default().with_max_buffer_bytes(config.max_buffer_bytes),
    );
    let mut opener = FileOpener::new(path);

    match config.output_bits {
        OutputBits::Sixteen => {
            let decoded = decoder.decode_i16(&mut opener)?;
            build_report(path, &decoded, config.output_bits, config)
        }
        OutputBits::ThirtyTwo => {
            let decoded = decoder.decode_i32(&mut opener)?;
            build_report(path, &decoded, config.output_bits, config)
        }
    }
}

/// 🚀 多文件处理
///
/// `config.jobs > 1` 时建立固定并发度的rayon线程池；结果顺序与输入一致。
/// 线程池创建失败时回退到串行处理。
pub fn probe_files(paths: &[PathBuf], config: &AppConfig) -> Vec<FileOutcome> {
    let probe = |path: &PathBuf| {
        let result = probe_file(path, config);
        match &result {
            Ok(report) => log::debug!(
                "✅ {} - {} 声道, {} Hz, {} 样本",
                utils::extract_filename_lossy(path),
                report.num_channels,
                report.sample_rate_hz,
                report.sample_count
            ),
            Err(e) => log::warn!("❌ {} - {e}", utils::extract_filename_lossy(path)),
        }
        FileOutcome {
            path: path.clone(),
            result,
        }
    };

    let degree = utils::effective_parallel_degree(config.jobs, paths.len());
    if degree <= 1 {
        return paths.iter().map(probe).collect();
    }

    match rayon::ThreadPoolBuilder::new()
        .num_threads(degree)
        .thread_name(|i| format!("wav-probe-{i}"))
        .build()
    {
        // par_iter + collect 保持输入顺序
        Ok(pool) => pool.install(|| paths.par_iter().map(probe).collect()),
        Err(e) => {
            log::warn!("线程池创建失败: {e}，回退到串行处理");
            paths.iter().map(probe).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AudioError;
    use crate::tools::cli::ChannelMapArgs;

    #[test]
    fn test_report_without_channel_map() {
        let decoded = DecodedWav {
            samples: vec![16384i16, -32768, 0, 8192],
            num_channels: 2,
            sample_rate_hz: 2,
        };
        let report = build_report(
            Path::new("x.wav"),
            &decoded,
            OutputBits::Sixteen,
            &AppConfig::default(),
        )
        .unwrap();

        assert_eq!(report.sample_count, 4);
        assert_eq!(report.num_frames, 2);
        assert!((report.duration_seconds - 1.0).abs() < 1e-12);
        assert_eq!(report.output_bits, 16);
        assert!((report.peak_dbfs[0] - (-6.0206)).abs() < 1e-3);
        assert!(report.peak_dbfs[1].abs() < 1e-9);
    }

    #[test]
    fn test_report_with_channel_map() {
        let decoded = DecodedWav {
            samples: vec![1_073_741_824i32, 0],
            num_channels: 2,
            sample_rate_hz: 48000,
        };
        let config = AppConfig {
            channel_map: Some(ChannelMapArgs {
                sources: "0,1,1".to_string(),
                gains_db: "0,0,-6".to_string(),
            }),
            ..AppConfig::default()
        };
        let report = build_report(Path::new("x.wav"), &decoded, OutputBits::ThirtyTwo, &config)
            .unwrap();

        assert_eq!(report.peak_dbfs.len(), 3);
        assert_eq!(report.peak_dbfs[0], f64::NEG_INFINITY);
        assert!((report.peak_dbfs[1] - (-6.0206)).abs() < 1e-3);
        assert!((report.peak_dbfs[2] - (-12.0206)).abs() < 1e-3);

        let bad = AppConfig {
            channel_map: Some(ChannelMapArgs {
                sources: "3".to_string(),
                gains_db: String::new(),
            }),
            ..AppConfig::default()
        };
        assert!(matches!(
            build_report(Path::new("x.wav"), &decoded, OutputBits::ThirtyTwo, &bad),
            Err(AudioError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_probe_files_keeps_order_and_errors() {
        let paths = vec![
            PathBuf::from("/nonexistent/one.wav"),
            PathBuf::from("/nonexistent/two.wav"),
        ];
        let config = AppConfig {
            jobs: 2,
            ..AppConfig::default()
        };
        let outcomes = probe_files(&paths, &config);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].path, paths[0]);
        assert_eq!(outcomes[1].path, paths[1]);
        assert!(
            outcomes
                .iter()
                .all(|o| matches!(o.result, Err(AudioError::IoError(_))))
        );
    }
}
