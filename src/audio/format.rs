//! 音频格式信息模块
//!
//! 解析 `fmt ` 块，得到声道数、采样率、位深度与样本编码，
//! 并在遇到 `data` 块后形成完整的解码描述 [`WavDecodeInfo`]。

use super::endian::{little_endian_read_u16, little_endian_read_u32, take_array};
use crate::error::{self, AudioResult};

/// `fmt ` 块的最小长度（PCMWAVEFORMAT）
pub const MIN_FORMAT_CHUNK_BYTES: usize = 16;

/// WAVE_FORMAT_EXTENSIBLE 扩展部分的最小长度（cbSize）
const EXTENSIBLE_EXTENSION_BYTES: u16 = 22;

/// 子格式GUID在 `fmt ` 负载中的偏移
const SUB_FORMAT_OFFSET: usize = 24;

/// `fmt ` 块中的格式标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTag {
    /// 线性整数PCM
    Pcm,
    /// IEEE 浮点
    IeeeFloat,
    /// G.711 A-law
    ALaw,
    /// G.711 μ-law
    MuLaw,
    /// WAVE_FORMAT_EXTENSIBLE，真实格式在子格式GUID中
    Extensible,
    Unknown(u16),
}

impl From<u16> for FormatTag {
    fn from(value: u16) -> Self {
        match value {
            0x0001 => FormatTag::Pcm,
            0x0003 => FormatTag::IeeeFloat,
            0x0006 => FormatTag::ALaw,
            0x0007 => FormatTag::MuLaw,
            0xFFFE => FormatTag::Extensible,
            other => FormatTag::Unknown(other),
        }
    }
}

/// 样本编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    Int16,
    Int32,
    Float32,
}

impl SampleFormat {
    /// 由（格式标签, 位深度）推导样本编码
    ///
    /// 8/24位PCM、非32位浮点、A-law/μ-law 等一律拒绝，不做升格转换。
    pub fn from_tag_and_bits(tag: FormatTag, bits_per_sample: u16) -> AudioResult<Self> {
        match (tag, bits_per_sample) {
            (FormatTag::Pcm, 16) => Ok(SampleFormat::Int16),
            (FormatTag::Pcm, 32) => Ok(SampleFormat::Int32),
            (FormatTag::IeeeFloat, 32) => Ok(SampleFormat::Float32),
            (FormatTag::Pcm, bits) => Err(error::unsupported_format(
                "仅支持16位或32位整数PCM",
                format!("{bits}位"),
            )),
            (FormatTag::IeeeFloat, bits) => Err(error::unsupported_format(
                "仅支持32位浮点",
                format!("{bits}位"),
            )),
            (other, _) => Err(error::unsupported_format(
                "仅支持PCM与IEEE浮点编码",
                format!("{other:?}"),
            )),
        }
    }

    /// 该编码一个样本的自然字节宽度
    pub fn natural_width_bytes(self) -> usize {
        match self {
            SampleFormat::Int16 => 2,
            SampleFormat::Int32 | SampleFormat::Float32 => 4,
        }
    }
}

/// 解析后的 `fmt ` 块
#[derive(Debug, Clone, PartialEq)]
pub struct FormatDescriptor {
    /// 解析后的格式标签（Extensible 已展开为子格式）
    pub format_tag: FormatTag,
    pub num_channels: u16,
    pub sample_rate_hz: u32,
    pub bits_per_sample: u16,
    pub sample_format: SampleFormat,
}

/// 解析 `fmt ` 块负载
///
/// 字节率与块对齐字段被忽略。Extensible 格式从子格式GUID的前两字节取真实标签。
pub fn resolve_format_chunk(payload: &[u8]) -> AudioResult<FormatDescriptor> {
    if payload.len() < MIN_FORMAT_CHUNK_BYTES {
        return Err(error::malformed_header(
            "fmt块过短",
            format!("{} 字节（至少 {MIN_FORMAT_CHUNK_BYTES}）", payload.len()),
        ));
    }

    let read_u16 = |offset| take_array::<2>(payload, offset).map(|b| little_endian_read_u16(&b));
    let read_u32 = |offset| take_array::<4>(payload, offset).map(|b| little_endian_read_u32(&b));

    // 长度已检查，前16字节的字段一定存在
    let raw_tag = read_u16(0).unwrap_or_default();
    let num_channels = read_u16(2).unwrap_or_default();
    let sample_rate_hz = read_u32(4).unwrap_or_default();
    let bits_per_sample = read_u16(14).unwrap_or_default();

    let mut format_tag = FormatTag::from(raw_tag);
    if format_tag == FormatTag::Extensible {
        let extension_size = read_u16(16).unwrap_or_default();
        let sub_format = read_u16(SUB_FORMAT_OFFSET)
            .filter(|_| extension_size >= EXTENSIBLE_EXTENSION_BYTES)
            .filter(|_| payload.len() >= SUB_FORMAT_OFFSET + 16)
            .ok_or_else(|| {
                error::unsupported_format(
                    "Extensible格式缺少子格式GUID，无法确定样本编码",
                    format!("cbSize={extension_size}, fmt长度={}", payload.len()),
                )
            })?;
        format_tag = FormatTag::from(sub_format);
        log::debug!("WAVE_FORMAT_EXTENSIBLE 子格式: {format_tag:?}");
    }

    if num_channels == 0 {
        return Err(error::malformed_header("声道数不能为0", ""));
    }
    if sample_rate_hz == 0 {
        return Err(error::malformed_header("采样率不能为0", ""));
    }

    let sample_format = SampleFormat::from_tag_and_bits(format_tag, bits_per_sample)?;

    Ok(FormatDescriptor {
        format_tag,
        num_channels,
        sample_rate_hz,
        bits_per_sample,
        sample_format,
    })
}

/// 一次解码会话的可变状态
///
/// `sample_format` 与 `bits_per_sample` 描述源编码；
/// `destination_alignment_bytes` 描述输出样本宽度，二者相互独立。
#[derive(Debug, Clone, PartialEq)]
pub struct WavDecodeInfo {
    pub num_channels: u16,
    pub sample_rate_hz: u32,
    pub sample_format: SampleFormat,
    pub bits_per_sample: u16,
    pub destination_alignment_bytes: usize,
    /// data块中尚未交付的样本数（声道数 × 帧数）
    pub remaining_samples: usize,
}

impl WavDecodeInfo {
    /// 由 `fmt ` 描述与 `data` 块声明长度构造最终描述
    ///
    /// 样本数只取决于声明长度，与底层传输实际可读字节数无关。
    pub fn new(format: &FormatDescriptor, data_len_bytes: u32) -> Self {
        let width = format.sample_format.natural_width_bytes();
        let data_len = data_len_bytes as usize;
        if data_len % width != 0 {
            log::warn!("data块长度 {data_len} 不是样本宽度 {width} 的整数倍，忽略末尾残余字节");
        }
        Self {
            num_channels: format.num_channels,
            sample_rate_hz: format.sample_rate_hz,
            sample_format: format.sample_format,
            bits_per_sample: format.bits_per_sample,
            destination_alignment_bytes: width,
            remaining_samples: data_len / width,
        }
    }

    /// 源编码中一个样本的字节数
    #[inline]
    pub fn source_sample_bytes(&self) -> usize {
        self.bits_per_sample as usize / 8
    }

    /// 将输出宽度提升到32位（16位源经由宽解码入口时使用）
    pub fn widen_destination(&mut self) {
        self.destination_alignment_bytes = 4;
    }

    /// 剩余样本全部解码所需的输出字节数
    pub fn destination_bytes(&self) -> u64 {
        (self.remaining_samples as u64).saturating_mul(self.destination_alignment_bytes as u64)
    }

    /// 剩余完整帧数
    pub fn remaining_frames(&self) -> usize {
        self.remaining_samples / self.num_channels.max(1) as usize
    }
}
