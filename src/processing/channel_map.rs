//! 声道映射与增益
//!
//! 描述多声道信号的重映射与逐声道增益：
//!
//! ```text
//! output[c] = gain[c] * input[source[c]]
//! ```
//!
//! 不做任何削波处理。

use crate::error::{self, AudioResult};
use std::fmt;

/// 支持的最大声道数
pub const MAX_CHANNELS: usize = 32;

/// 单个输出声道的映射项
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelMapEntry {
    /// 线性幅度增益
    pub gain: f32,
    /// 输入声道索引（从0开始）
    pub source: usize,
}

impl ChannelMapEntry {
    /// 静音输出（对应源列表中的 "0"）
    const SILENT: ChannelMapEntry = ChannelMapEntry {
        gain: 0.0,
        source: 0,
    };

    pub fn is_silent(&self) -> bool {
        self.gain == 0.0
    }
}

/// 声道映射表，解析后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMap {
    channels: Vec<ChannelMapEntry>,
    num_input_channels: usize,
}

impl ChannelMap {
    /// 解析逗号分隔的源列表（从1开始，0表示静音）与dB增益列表
    ///
    /// 增益列表短于源列表时其余声道为0 dB；更长时忽略多余项。
    ///
    /// # 示例
    ///
    /// ```rust
    /// use pcm_wav_reader::processing::ChannelMap;
    ///
    /// let map = ChannelMap::parse(2, "1,0,2", "-6").unwrap();
    /// assert_eq!(map.num_output_channels(), 3);
    /// assert!(map.channels()[1].is_silent());
    /// ```
    pub fn parse(
        num_input_channels: usize,
        source_list: &str,
        gains_db_list: &str,
    ) -> AudioResult<Self> {
        if num_input_channels == 0 || num_input_channels > MAX_CHANNELS {
            return Err(error::invalid_argument(
                "输入声道数",
                format!("{num_input_channels}（应为1-{MAX_CHANNELS}）"),
            ));
        }

        let sources = split_list(source_list);
        if sources.is_empty() {
            return Err(error::invalid_argument("声道源列表", "不能为空"));
        }
        if sources.len() > MAX_CHANNELS {
            return Err(error::invalid_argument(
                "声道源列表",
                format!("{} 个输出声道超出上限 {MAX_CHANNELS}", sources.len()),
            ));
        }

        let gains_db = split_list(gains_db_list)
            .into_iter()
            .map(|token| {
                token
                    .parse::<f32>()
                    .map_err(|e| error::invalid_argument(&format!("增益 \"{token}\""), e))
            })
            .collect::<AudioResult<Vec<f32>>>()?;

        let mut channels = Vec::with_capacity(sources.len());
        for (index, token) in sources.iter().enumerate() {
            let source: usize = token
                .parse()
                .map_err(|e| error::invalid_argument(&format!("声道源 \"{token}\""), e))?;
            if source > num_input_channels {
                return Err(error::invalid_argument(
                    &format!("声道源 \"{token}\""),
                    format!("超出输入声道数 {num_input_channels}"),
                ));
            }

            let entry = if source == 0 {
                ChannelMapEntry::SILENT
            } else {
                let gain_db = gains_db.get(index).copied().unwrap_or(0.0);
                ChannelMapEntry {
                    gain: db_to_linear(gain_db),
                    source: source - 1,
                }
            };
            channels.push(entry);
        }

        Ok(Self {
            channels,
            num_input_channels,
        })
    }

    /// 恒等映射（全部0 dB）
    pub fn identity(num_channels: usize) -> AudioResult<Self> {
        let sources: Vec<String> = (1..=num_channels).map(|c| c.to_string()).collect();
        Self::parse(num_channels, &sources.join(","), "")
    }

    pub fn channels(&self) -> &[ChannelMapEntry] {
        &self.channels
    }

    pub fn num_input_channels(&self) -> usize {
        self.num_input_channels
    }

    pub fn num_output_channels(&self) -> usize {
        self.channels.len()
    }

    /// 应用映射与增益
    ///
    /// `input` 含 `num_input_channels * num_frames` 个交错样本，
    /// `output` 需容纳 `num_output_channels * num_frames` 个样本。
    pub fn apply(&self, input: &[f32], num_frames: usize, output: &mut [f32]) -> AudioResult<()> {
        let in_channels = self.num_input_channels;
        let out_channels = self.channels.len();
        if input.len() < in_channels * num_frames {
            return Err(error::invalid_argument(
                "输入缓冲区",
                format!("{} 个样本不足 {num_frames} 帧", input.len()),
            ));
        }
        if output.len() < out_channels * num_frames {
            return Err(error::invalid_argument(
                "输出缓冲区",
                format!("{} 个样本不足 {num_frames} 帧", output.len()),
            ));
        }

        for (in_frame, out_frame) in input
            .chunks_exact(in_channels)
            .zip(output.chunks_exact_mut(out_channels))
            .take(num_frames)
        {
            for (dst, entry) in out_frame.iter_mut().zip(&self.channels) {
                *dst = entry.gain * in_frame[entry.source];
            }
        }
        Ok(())
    }
}

impl fmt::Display for ChannelMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "声道映射: {} 输入 → {} 输出",
            self.num_input_channels,
            self.channels.len()
        )?;
        for (c, entry) in self.channels.iter().enumerate() {
            if entry.is_silent() {
                writeln!(f, "  输出 {:2}: 静音", c + 1)?;
            } else {
                writeln!(
                    f,
                    "  输出 {:2}: 源 {:2}, 增益 {:6.1} dB",
                    c + 1,
                    entry.source + 1,
                    linear_to_db(entry.gain)
                )?;
            }
        }
        Ok(())
    }
}

fn split_list(list: &str) -> Vec<&str> {
    list.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

#[inline]
fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

#[inline]
fn linear_to_db(gain: f32) -> f32 {
    20.0 * gain.log10()
}
