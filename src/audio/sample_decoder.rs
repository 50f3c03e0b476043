//! 样本流解码
//!
//! 从 `data` 负载读取原始字节并转换为调用方要求的输出表示：
//! - 窄解码（i16输出）：仅接受 Int16 源，原样复制
//! - 宽解码（i32输出）：Int16 符号扩展、Int32 原样复制、Float32 归一化映射并饱和
//!
//! 两个入口共用同一块读循环。流在样本中途结束时立即停止（残缺样本不交付），
//! 这不是错误，调用方只会观察到少于请求的样本数。

use super::byte_source::ByteSource;
use super::chunk::{ChunkHandler, ChunkWalker};
use super::endian::{little_endian_read_f32, little_endian_read_i16, little_endian_read_i32};
use super::format::{SampleFormat, WavDecodeInfo};
use crate::error::{self, AudioResult};

/// 单次从字节源读取的暂存区大小（2与4的公倍数）
const SCRATCH_BYTES: usize = 8192;

/// 浮点归一化因子：[-1.0, 1.0] 映射到完整的 i32 范围
pub(crate) const FLOAT_TO_INT32_SCALE: f64 = 2_147_483_648.0;

/// 将归一化浮点样本映射为 i32
///
/// `value × 2^31` 后饱和到 `[i32::MIN, i32::MAX]`，NaN 映射为 0。
/// 例如 1.0 → 2147483647，-1.0 → -2147483648，0.5 → 1073741824。
#[inline]
pub fn float_to_i32(value: f32) -> i32 {
    let normalized = f64::from(value) * FLOAT_TO_INT32_SCALE;
    if normalized.is_nan() {
        return 0;
    }
    normalized.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

/// 通用块读循环
///
/// 每个源样本宽 `width` 字节，用 `decode` 转换后写入 `out`。
/// 返回 `min(out.len(), remaining_samples, 可读完整样本数)`，并据此递减 `remaining_samples`。
/// 读取出错时，出错前已完成的块仍从 `remaining_samples` 中扣除。
fn decode_samples<S, T, F>(
    source: &mut S,
    info: &mut WavDecodeInfo,
    out: &mut [T],
    width: usize,
    decode: F,
) -> AudioResult<usize>
where
    S: ByteSource,
    F: Fn(&[u8]) -> T,
{
    let requested = out.len().min(info.remaining_samples);
    let per_block = SCRATCH_BYTES / width;
    let mut scratch = [0u8; SCRATCH_BYTES];
    let mut decoded = 0;

    while decoded < requested {
        let count = (requested - decoded).min(per_block);
        let want = count * width;
        let got = match source.read(&mut scratch[..want]) {
            Ok(got) => got,
            Err(e) => {
                // 已交付的块同样计入消费
                info.remaining_samples -= decoded;
                return Err(e.into());
            }
        };
        let whole = got / width;

        for (dst, raw) in out[decoded..decoded + whole]
            .iter_mut()
            .zip(scratch[..whole * width].chunks_exact(width))
        {
            *dst = decode(raw);
        }
        decoded += whole;

        if got < want {
            log::warn!("data负载被截断: 本次请求 {requested} 个样本，实际只读到 {decoded} 个");
            break;
        }
    }

    info.remaining_samples -= decoded;
    Ok(decoded)
}

fn decode_i16(raw: &[u8]) -> i16 {
    little_endian_read_i16(&[raw[0], raw[1]])
}

fn decode_i32(raw: &[u8]) -> i32 {
    little_endian_read_i32(&[raw[0], raw[1], raw[2], raw[3]])
}

fn decode_f32(raw: &[u8]) -> f32 {
    little_endian_read_f32(&[raw[0], raw[1], raw[2], raw[3]])
}

/// 窄解码：读取最多 `out.len()` 个16位样本
///
/// 源编码不是 Int16 时返回 `UnsupportedFormat`，不做静默截断。
pub fn read_i16_samples<S: ByteSource>(
    source: &mut S,
    info: &mut WavDecodeInfo,
    out: &mut [i16],
) -> AudioResult<usize> {
    match info.sample_format {
        SampleFormat::Int16 => decode_samples(source, info, out, 2, decode_i16),
        other => Err(error::unsupported_format(
            "16位解码仅支持16位PCM源",
            format!("{other:?}"),
        )),
    }
}

/// 宽解码：读取最多 `out.len()` 个样本并输出为 i32
///
/// Int16 符号扩展（不缩放），Int32 原样复制，Float32 经 [`float_to_i32`] 转换。
pub fn read_i32_samples<S: ByteSource>(
    source: &mut S,
    info: &mut WavDecodeInfo,
    out: &mut [i32],
) -> AudioResult<usize> {
    match info.sample_format {
        SampleFormat::Int16 => {
            decode_samples(source, info, out, 2, |raw| i32::from(decode_i16(raw)))
        }
        SampleFormat::Int32 => decode_samples(source, info, out, 4, decode_i32),
        // 从同宽的字节暂存区逐样本显式转换，不在输出缓冲上做原地重解释
        SampleFormat::Float32 => {
            decode_samples(source, info, out, 4, |raw| float_to_i32(decode_f32(raw)))
        }
    }
}

/// 流式WAV读取会话
///
/// 持有字节源与已完成的解码描述，允许调用方按任意块大小增量解码。
/// 任一次读取返回错误后会话即终止，此后的读取一律失败。
pub struct WavReader<S> {
    source: S,
    info: WavDecodeInfo,
    failed: bool,
}

impl<S: ByteSource> WavReader<S> {
    /// 解析头部并创建会话，成功后字节源位于样本数据起始处
    pub fn new(mut source: S) -> AudioResult<Self> {
        let info = ChunkWalker::new().read_header(&mut source)?;
        Ok(Self::from_parts(source, info))
    }

    /// 解析头部时把未知块交给 `handler`
    pub fn with_chunk_handler(mut source: S, handler: &mut dyn ChunkHandler) -> AudioResult<Self> {
        let info = ChunkWalker::new()
            .with_handler(handler)
            .read_header(&mut source)?;
        Ok(Self::from_parts(source, info))
    }

    fn from_parts(source: S, info: WavDecodeInfo) -> Self {
        Self {
            source,
            info,
            failed: false,
        }
    }

    pub fn info(&self) -> &WavDecodeInfo {
        &self.info
    }

    /// data块中尚未交付的样本数
    pub fn remaining_samples(&self) -> usize {
        self.info.remaining_samples
    }

    pub fn read_i16_samples(&mut self, out: &mut [i16]) -> AudioResult<usize> {
        self.ensure_usable()?;
        let result = read_i16_samples(&mut self.source, &mut self.info, out);
        self.failed = result.is_err();
        result
    }

    pub fn read_i32_samples(&mut self, out: &mut [i32]) -> AudioResult<usize> {
        self.ensure_usable()?;
        let result = read_i32_samples(&mut self.source, &mut self.info, out);
        self.failed = result.is_err();
        result
    }

    fn ensure_usable(&self) -> AudioResult<()> {
        if self.failed {
            return Err(error::invalid_argument("解码会话", "已因先前的错误终止"));
        }
        Ok(())
    }

    /// 结束会话，取回字节源
    pub fn into_inner(self) -> S {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::byte_source::SliceSource;
    use crate::error::AudioError;

    fn info(format: SampleFormat, bits: u16, samples: usize) -> WavDecodeInfo {
        WavDecodeInfo {
            num_channels: 1,
            sample_rate_hz: 8000,
            sample_format: format,
            bits_per_sample: bits,
            destination_alignment_bytes: format.natural_width_bytes(),
            remaining_samples: samples,
        }
    }

    #[test]
    fn test_float_conversion_boundaries() {
        assert_eq!(float_to_i32(1.0), i32::MAX);
        assert_eq!(float_to_i32(-1.0), i32::MIN);
        assert_eq!(float_to_i32(0.5), 1_073_741_824);
        assert_eq!(float_to_i32(-0.5), -1_073_741_824);
        assert_eq!(float_to_i32(0.0), 0);
        assert_eq!(float_to_i32(f32::NAN), 0);
        assert_eq!(float_to_i32(2.5), i32::MAX);
        assert_eq!(float_to_i32(-7.0), i32::MIN);
        assert_eq!(float_to_i32(f32::INFINITY), i32::MAX);
        assert_eq!(float_to_i32(f32::NEG_INFINITY), i32::MIN);
    }

    #[test]
    fn test_narrow_decode_copies_samples() {
        let values: [i16; 4] = [0, -1, i16::MAX, i16::MIN];
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut source = SliceSource::new(&bytes);
        let mut info = info(SampleFormat::Int16, 16, 4);
        let mut out = [0i16; 4];

        assert_eq!(read_i16_samples(&mut source, &mut info, &mut out).unwrap(), 4);
        assert_eq!(out, values);
        assert_eq!(info.remaining_samples, 0);
    }

    #[test]
    fn test_narrow_decode_rejects_wide_sources() {
        for (format, bits) in [(SampleFormat::Int32, 32), (SampleFormat::Float32, 32)] {
            let mut source = SliceSource::new(&[0u8; 8]);
            let mut info = info(format, bits, 2);
            let result = read_i16_samples(&mut source, &mut info, &mut [0i16; 2]);
            assert!(matches!(result, Err(AudioError::UnsupportedFormat(_))));
            assert_eq!(info.remaining_samples, 2, "失败时不应消费样本");
        }
    }

    #[test]
    fn test_wide_decode_sign_extends_int16() {
        let values: [i16; 3] = [-2, 300, i16::MIN];
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut source = SliceSource::new(&bytes);
        let mut info = info(SampleFormat::Int16, 16, 3);
        let mut out = [0i32; 3];

        assert_eq!(read_i32_samples(&mut source, &mut info, &mut out).unwrap(), 3);
        assert_eq!(out, [-2, 300, -32768]);
    }

    #[test]
    fn test_wide_decode_int32_and_float() {
        let bytes: Vec<u8> = [i32::MIN, -1, 7, i32::MAX]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let mut out = [0i32; 4];
        let mut info32 = info(SampleFormat::Int32, 32, 4);
        read_i32_samples(&mut SliceSource::new(&bytes), &mut info32, &mut out).unwrap();
        assert_eq!(out, [i32::MIN, -1, 7, i32::MAX]);

        let bytes: Vec<u8> = [1.0f32, -1.0, 0.5, f32::NAN]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let mut info_f = info(SampleFormat::Float32, 32, 4);
        read_i32_samples(&mut SliceSource::new(&bytes), &mut info_f, &mut out).unwrap();
        assert_eq!(out, [i32::MAX, i32::MIN, 1_073_741_824, 0]);
    }

    #[test]
    fn test_decode_respects_request_and_remaining() {
        let bytes: Vec<u8> = (0..10i16).flat_map(|v| v.to_le_bytes()).collect();
        let mut source = SliceSource::new(&bytes);
        let mut info = info(SampleFormat::Int16, 16, 6);

        let mut out = [0i16; 4];
        assert_eq!(read_i16_samples(&mut source, &mut info, &mut out).unwrap(), 4);
        assert_eq!(out, [0, 1, 2, 3]);
        assert_eq!(info.remaining_samples, 2);

        // 剩余样本数限制了交付数量，即便字节源还有数据
        assert_eq!(read_i16_samples(&mut source, &mut info, &mut out).unwrap(), 2);
        assert_eq!(&out[..2], &[4, 5]);
        assert_eq!(read_i16_samples(&mut source, &mut info, &mut out).unwrap(), 0);
    }

    #[test]
    fn test_truncated_tail_stops_without_error() {
        // 3个完整样本 + 1个残缺字节
        let bytes = [1u8, 0, 2, 0, 3, 0, 4];
        let mut source = SliceSource::new(&bytes);
        let mut info = info(SampleFormat::Int16, 16, 10);
        let mut out = [0i16; 10];

        assert_eq!(read_i16_samples(&mut source, &mut info, &mut out).unwrap(), 3);
        assert_eq!(&out[..3], &[1, 2, 3]);
        assert_eq!(info.remaining_samples, 7);
        assert_eq!(read_i16_samples(&mut source, &mut info, &mut out).unwrap(), 0);
    }

    /// 读取位置到达 `fail_at` 后的第一次读取失败
    struct FailingSource<'a> {
        inner: SliceSource<'a>,
        fail_at: usize,
    }

    impl ByteSource for FailingSource<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.inner.position() >= self.fail_at {
                self.fail_at = usize::MAX;
                return Err(std::io::Error::other("介质读取失败"));
            }
            self.inner.read(buf)
        }

        fn seek_forward(&mut self, num_bytes: u64) -> std::io::Result<()> {
            self.inner.seek_forward(num_bytes)
        }

        fn is_at_end(&self) -> bool {
            self.inner.is_at_end()
        }
    }

    #[test]
    fn test_read_error_still_counts_consumed_blocks() {
        let per_block = SCRATCH_BYTES / 2;
        let bytes = vec![0u8; (per_block + 100) * 2];
        let mut source = FailingSource {
            inner: SliceSource::new(&bytes),
            fail_at: 1,
        };
        let mut info = info(SampleFormat::Int16, 16, per_block + 100);
        let mut out = vec![0i16; per_block + 100];

        let result = read_i16_samples(&mut source, &mut info, &mut out);
        assert!(matches!(result, Err(AudioError::IoError(_))));
        assert_eq!(info.remaining_samples, 100, "第一块已从字节源消费");
    }

    #[test]
    fn test_large_decode_spans_multiple_blocks() {
        let count = SCRATCH_BYTES; // 2倍暂存区的字节数
        let bytes: Vec<u8> = (0..count)
            .flat_map(|i| (i as i16).wrapping_mul(7).to_le_bytes())
            .collect();
        let mut source = SliceSource::new(&bytes);
        let mut info = info(SampleFormat::Int16, 16, count);
        let mut out = vec![0i16; count];

        assert_eq!(read_i16_samples(&mut source, &mut info, &mut out).unwrap(), count);
        assert!(
            out.iter()
                .enumerate()
                .all(|(i, &v)| v == (i as i16).wrapping_mul(7))
        );
    }
}
