//! WAV文件解码器
//!
//! 常见场景的一站式流程：打开字节源 → 解析头部 → 按剩余样本数精确分配缓冲区
//! → 解码全部样本 → 关闭字节源 → 返回样本与声道数、采样率。
//!
//! 任一步骤失败都会释放已分配的缓冲区，并保证已打开的字节源恰好关闭一次。

use super::byte_source::{ByteSource, FileOpener, SourceOpener};
use super::chunk::{ChunkWalker, DEFAULT_MAX_FORMAT_CHUNK_BYTES};
use super::format::{SampleFormat, WavDecodeInfo};
use super::sample_decoder::{read_i16_samples, read_i32_samples};
use crate::error::{self, AudioError, AudioResult};
use std::path::Path;

/// 默认输出缓冲区上限（1 GiB）
pub const DEFAULT_MAX_BUFFER_BYTES: u64 = 1024 * 1024 * 1024;

/// 解码配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// 输出缓冲区字节数上限，超出按 `OutOfMemory` 处理
    pub max_buffer_bytes: u64,

    /// `fmt ` 块负载长度上限
    pub max_format_chunk_bytes: usize,
}

impl DecodeOptions {
    pub fn with_max_buffer_bytes(mut self, limit: u64) -> Self {
        self.max_buffer_bytes = limit;
        self
    }

    pub fn with_max_format_chunk_bytes(mut self, limit: usize) -> Self {
        self.max_format_chunk_bytes = limit;
        self
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
            max_format_chunk_bytes: DEFAULT_MAX_FORMAT_CHUNK_BYTES,
        }
    }
}

/// 解码结果：交错排列的样本与元数据
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedWav<T> {
    /// 交错样本，长度即实际交付的样本数
    pub samples: Vec<T>,
    pub num_channels: u16,
    pub sample_rate_hz: u32,
}

impl<T> DecodedWav<T> {
    /// 实际解码的样本总数（声道数 × 帧数）
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// 完整帧数
    pub fn num_frames(&self) -> usize {
        self.samples.len() / self.num_channels.max(1) as usize
    }

    /// 音频时长（秒）
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate_hz == 0 {
            return 0.0;
        }
        self.num_frames() as f64 / self.sample_rate_hz as f64
    }
}

/// 输出样本类型：决定使用窄解码还是宽解码
pub trait OutputSample: Copy + Default {
    /// 检查源编码并调整输出宽度，不合法时在分配前拒绝
    fn prepare(info: &mut WavDecodeInfo) -> AudioResult<()>;

    fn decode<S: ByteSource>(
        source: &mut S,
        info: &mut WavDecodeInfo,
        out: &mut [Self],
    ) -> AudioResult<usize>;
}

impl OutputSample for i16 {
    fn prepare(info: &mut WavDecodeInfo) -> AudioResult<()> {
        if info.sample_format != SampleFormat::Int16 {
            return Err(error::unsupported_format(
                "16位输出仅支持16位PCM文件",
                format!("{:?}（{}位）", info.sample_format, info.bits_per_sample),
            ));
        }
        Ok(())
    }

    fn decode<S: ByteSource>(
        source: &mut S,
        info: &mut WavDecodeInfo,
        out: &mut [Self],
    ) -> AudioResult<usize> {
        read_i16_samples(source, info, out)
    }
}

impl OutputSample for i32 {
    fn prepare(info: &mut WavDecodeInfo) -> AudioResult<()> {
        // 16位源升格为32位输出
        if info.sample_format == SampleFormat::Int16 {
            info.widen_destination();
        }
        Ok(())
    }

    fn decode<S: ByteSource>(
        source: &mut S,
        info: &mut WavDecodeInfo,
        out: &mut [Self],
    ) -> AudioResult<usize> {
        read_i32_samples(source, info, out)
    }
}

/// 高层WAV解码器
#[derive(Debug, Clone, Default)]
pub struct WavFileDecoder {
    options: DecodeOptions,
}

impl WavFileDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// 解码整个文件为 i32 样本（16位源符号扩展，浮点源饱和映射）
    pub fn decode_i32<O: SourceOpener>(&self, opener: &mut O) -> AudioResult<DecodedWav<i32>> {
        self.decode(opener)
    }

    /// 解码整个16位PCM文件为 i16 样本
    pub fn decode_i16<O: SourceOpener>(&self, opener: &mut O) -> AudioResult<DecodedWav<i16>> {
        self.decode(opener)
    }

    /// 打开 → 解码 → 关闭
    ///
    /// 关闭在成功与失败路径上都恰好执行一次；关闭失败视同整体失败，缓冲区随之释放。
    pub fn decode<O, T>(&self, opener: &mut O) -> AudioResult<DecodedWav<T>>
    where
        O: SourceOpener,
        T: OutputSample,
    {
        let mut source = opener.open().map_err(|e| {
            log::error!("无法打开 \"{}\": {e}", opener.describe());
            AudioError::IoError(e)
        })?;

        let decoded = self.decode_session(&mut source);
        let closed = opener.close(source);

        match (decoded, closed) {
            (Ok(decoded), Ok(())) => Ok(decoded),
            (Ok(_), Err(e)) => {
                log::error!("关闭 \"{}\" 失败: {e}", opener.describe());
                Err(AudioError::IoError(e))
            }
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    log::warn!("关闭 \"{}\" 失败: {close_err}", opener.describe());
                }
                log::error!("解码 \"{}\" 失败: {e}", opener.describe());
                Err(e)
            }
        }
    }

    fn decode_session<S, T>(&self, source: &mut S) -> AudioResult<DecodedWav<T>>
    where
        S: ByteSource,
        T: OutputSample,
    {
        let mut info = ChunkWalker::new()
            .max_format_chunk_bytes(self.options.max_format_chunk_bytes)
            .read_header(source)?;
        T::prepare(&mut info)?;

        let mut samples = allocate_samples::<T>(&info, self.options.max_buffer_bytes)?;
        let delivered = T::decode(source, &mut info, &mut samples)?;
        if delivered < samples.len() {
            // 截断文件：缓冲区收缩到实际交付的样本数
            samples.truncate(delivered);
            samples.shrink_to_fit();
        }

        Ok(DecodedWav {
            samples,
            num_channels: info.num_channels,
            sample_rate_hz: info.sample_rate_hz,
        })
    }
}

/// 按剩余样本数精确分配输出缓冲区
fn allocate_samples<T: OutputSample>(info: &WavDecodeInfo, limit: u64) -> AudioResult<Vec<T>> {
    let requested_bytes = info.destination_bytes();
    if requested_bytes > limit {
        log::error!("样本缓冲区 {requested_bytes} 字节超出上限 {limit} 字节");
        return Err(AudioError::OutOfMemory { requested_bytes });
    }

    let mut samples = Vec::new();
    samples
        .try_reserve_exact(info.remaining_samples)
        .map_err(|_| AudioError::OutOfMemory { requested_bytes })?;
    samples.resize(info.remaining_samples, T::default());
    Ok(samples)
}

fn file_opener(path: &Path) -> AudioResult<FileOpener> {
    if path.as_os_str().is_empty() {
        return Err(error::invalid_argument("文件路径", "不能为空"));
    }
    Ok(FileOpener::new(path))
}

/// 读取WAV文件为 i32 样本
///
/// # 错误
///
/// * `AudioError::InvalidArgument` - 路径为空（不触碰任何资源）
/// * `AudioError::IoError` - 文件无法打开/关闭
/// * `AudioError::MalformedHeader` - RIFF结构损坏
/// * `AudioError::UnsupportedFormat` - 不支持的样本编码
/// * `AudioError::OutOfMemory` - 输出缓冲区分配失败
///
/// # 示例
///
/// ```rust
/// use pcm_wav_reader::audio::read_wav_file;
///
/// let result = read_wav_file("nonexistent.wav");
/// assert!(result.is_err());
/// ```
pub fn read_wav_file<P: AsRef<Path>>(path: P) -> AudioResult<DecodedWav<i32>> {
    let mut opener = file_opener(path.as_ref())?;
    WavFileDecoder::new().decode_i32(&mut opener)
}

/// 读取16位PCM WAV文件为 i16 样本，其他编码返回 `UnsupportedFormat`
pub fn read_16bit_wav_file<P: AsRef<Path>>(path: P) -> AudioResult<DecodedWav<i16>> {
    let mut opener = file_opener(path.as_ref())?;
    WavFileDecoder::new().decode_i16(&mut opener)
}
