//! RIFF块遍历
//!
//! 校验 `RIFF....WAVE` 前导后逐块遍历：
//! - `fmt ` 交给格式解析器
//! - `data` 结束遍历（样本由调用方随后按需解码）
//! - 其他块交给可选的 [`ChunkHandler`]，未消费的部分与填充字节由遍历器跳过

use super::byte_source::ByteSource;
use super::endian::{little_endian_read_u32, take_array};
use super::format::{FormatDescriptor, WavDecodeInfo, resolve_format_chunk};
use crate::error::{self, AudioResult};
use std::fmt;
use std::io;

/// `fmt ` 块负载的默认长度上限
pub const DEFAULT_MAX_FORMAT_CHUNK_BYTES: usize = 64 * 1024;

/// 4字节ASCII块标识
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkId(pub [u8; 4]);

impl ChunkId {
    pub const RIFF: ChunkId = ChunkId(*b"RIFF");
    pub const WAVE: ChunkId = ChunkId(*b"WAVE");
    pub const FMT: ChunkId = ChunkId(*b"fmt ");
    pub const DATA: ChunkId = ChunkId(*b"data");

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0 {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkId(\"{self}\")")
    }
}

/// 块的分类：已知块各自一种，未知块携带其标识
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Format,
    Data,
    Other(ChunkId),
}

impl From<ChunkId> for ChunkKind {
    fn from(id: ChunkId) -> Self {
        match id {
            ChunkId::FMT => ChunkKind::Format,
            ChunkId::DATA => ChunkKind::Data,
            other => ChunkKind::Other(other),
        }
    }
}

/// 限定在单个块负载范围内的字节源
///
/// 交给 [`ChunkHandler`] 使用，读取与跳转都不会越过块边界。
pub struct ChunkPayload<'a> {
    source: &'a mut dyn ByteSource,
    remaining: u64,
}

impl<'a> ChunkPayload<'a> {
    fn new(source: &'a mut dyn ByteSource, len: u64) -> Self {
        Self {
            source,
            remaining: len,
        }
    }

    /// 负载中尚未读取的字节数
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl ByteSource for ChunkPayload<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let limit = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let n = self.source.read(&mut buf[..limit])?;
        self.remaining -= n as u64;
        Ok(n)
    }

    fn seek_forward(&mut self, num_bytes: u64) -> io::Result<()> {
        if num_bytes > self.remaining {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("跳转越过块边界: 剩余 {} 字节", self.remaining),
            ));
        }
        self.source.seek_forward(num_bytes)?;
        self.remaining -= num_bytes;
        Ok(())
    }

    fn is_at_end(&self) -> bool {
        self.remaining == 0 || self.source.is_at_end()
    }
}

/// 自定义块处理器
///
/// 对每个未识别的块调用一次，负载读取位置位于块起始处。
/// 处理器可以只读取部分负载；返回错误会中止头部解析。
pub trait ChunkHandler {
    fn handle_chunk(
        &mut self,
        id: ChunkId,
        len: u32,
        payload: &mut ChunkPayload<'_>,
    ) -> AudioResult<()>;
}

impl<F> ChunkHandler for F
where
    F: FnMut(ChunkId, u32, &mut ChunkPayload<'_>) -> AudioResult<()>,
{
    fn handle_chunk(
        &mut self,
        id: ChunkId,
        len: u32,
        payload: &mut ChunkPayload<'_>,
    ) -> AudioResult<()> {
        self(id, len, payload)
    }
}

/// 块遍历器
pub struct ChunkWalker<'h> {
    handler: Option<&'h mut dyn ChunkHandler>,
    max_format_chunk_bytes: usize,
}

impl<'h> ChunkWalker<'h> {
    pub fn new() -> Self {
        Self {
            handler: None,
            max_format_chunk_bytes: DEFAULT_MAX_FORMAT_CHUNK_BYTES,
        }
    }

    /// 注册自定义块处理器
    pub fn with_handler(mut self, handler: &'h mut dyn ChunkHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// 设置 `fmt ` 块负载长度上限
    pub fn max_format_chunk_bytes(mut self, limit: usize) -> Self {
        self.max_format_chunk_bytes = limit;
        self
    }

    /// 从RIFF前导开始解析，直到遇到 `data` 块
    ///
    /// 成功返回时字节源位于 `data` 负载起始处。
    pub fn read_header<S: ByteSource>(&mut self, source: &mut S) -> AudioResult<WavDecodeInfo> {
        read_preamble(source)?;

        let mut format: Option<FormatDescriptor> = None;
        loop {
            let mut header = [0u8; 8];
            read_exact(source, &mut header, "在找到data块之前到达流末尾")?;
            let id = ChunkId([header[0], header[1], header[2], header[3]]);
            let len = take_array::<4>(&header, 4)
                .map(|bytes| little_endian_read_u32(&bytes))
                .unwrap_or_default();
            // RIFF要求奇数长度的块后跟一个填充字节
            let padding = u64::from(len & 1);
            log::debug!("RIFF块 \"{id}\": {len} 字节");

            match ChunkKind::from(id) {
                ChunkKind::Format => {
                    let payload_len = len as usize;
                    if payload_len > self.max_format_chunk_bytes {
                        return Err(error::malformed_header(
                            "fmt块长度超出上限",
                            format!("{payload_len} > {}", self.max_format_chunk_bytes),
                        ));
                    }
                    let mut payload = vec![0u8; payload_len];
                    read_exact(source, &mut payload, "fmt块被截断")?;
                    if format.is_some() {
                        log::warn!("出现重复的fmt块，以最后一个为准");
                    }
                    format = Some(resolve_format_chunk(&payload)?);
                    skip(source, padding)?;
                }
                ChunkKind::Data => {
                    let format = format.ok_or_else(|| {
                        error::malformed_header("data块出现在fmt块之前", "缺少fmt块")
                    })?;
                    return Ok(WavDecodeInfo::new(&format, len));
                }
                ChunkKind::Other(id) => {
                    let mut unread = u64::from(len);
                    if let Some(handler) = self.handler.as_deref_mut() {
                        let mut payload = ChunkPayload::new(source, u64::from(len));
                        handler.handle_chunk(id, len, &mut payload)?;
                        unread = payload.remaining();
                    }
                    skip(source, unread + padding)?;
                }
            }
        }
    }
}

impl Default for ChunkWalker<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// 使用默认设置解析WAV头部（无自定义块处理器）
pub fn read_wav_header<S: ByteSource>(source: &mut S) -> AudioResult<WavDecodeInfo> {
    ChunkWalker::new().read_header(source)
}

fn read_preamble<S: ByteSource>(source: &mut S) -> AudioResult<()> {
    let mut preamble = [0u8; 12];
    read_exact(source, &mut preamble, "缺少RIFF/WAVE前导")?;

    let riff = ChunkId([preamble[0], preamble[1], preamble[2], preamble[3]]);
    let wave = ChunkId([preamble[8], preamble[9], preamble[10], preamble[11]]);
    if riff != ChunkId::RIFF || wave != ChunkId::WAVE {
        return Err(error::malformed_header(
            "缺少RIFF/WAVE前导",
            format!("实际为 \"{riff}\"/\"{wave}\""),
        ));
    }

    let riff_size = take_array::<4>(&preamble, 4)
        .map(|bytes| little_endian_read_u32(&bytes))
        .unwrap_or_default();
    if riff_size < 4 {
        log::warn!("RIFF声明长度异常: {riff_size}，继续解析");
    }
    Ok(())
}

fn read_exact<S: ByteSource>(source: &mut S, buf: &mut [u8], context: &str) -> AudioResult<()> {
    let n = source.read(buf)?;
    if n < buf.len() {
        return Err(error::malformed_header(
            context,
            format!("需要 {} 字节，仅读到 {n} 字节", buf.len()),
        ));
    }
    Ok(())
}

fn skip<S: ByteSource>(source: &mut S, num_bytes: u64) -> AudioResult<()> {
    if num_bytes == 0 {
        return Ok(());
    }
    source
        .seek_forward(num_bytes)
        .map_err(|e| error::malformed_header("块长度超出流范围", e))
}
