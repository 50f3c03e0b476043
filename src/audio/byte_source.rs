//! 字节源抽象
//!
//! 解码器只依赖三种能力：读取N字节、相对向前跳转、判断是否已到流末尾。
//! 文件、内存缓冲区或网络流只需实现 [`ByteSource`] 即可接入解码管线。

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// 解码会话借用的字节源能力集
///
/// 约定：`read` 只有在到达流末尾时才返回少于请求的字节数，
/// 此后的读取一律返回 0。
pub trait ByteSource {
    /// 读取最多 `buf.len()` 字节，返回实际读取数
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// 从当前位置向前跳过 `num_bytes` 字节
    ///
    /// 目标位置超出流长度时失败，不移动读取位置。
    fn seek_forward(&mut self, num_bytes: u64) -> io::Result<()>;

    /// 是否已没有可读字节
    fn is_at_end(&self) -> bool;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    #[inline]
    fn seek_forward(&mut self, num_bytes: u64) -> io::Result<()> {
        (**self).seek_forward(num_bytes)
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        (**self).is_at_end()
    }
}

fn seek_past_end_error(position: u64, num_bytes: u64, len: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("跳转越界: 位置 {position} + {num_bytes} 字节超出流长度 {len}"),
    )
}

/// 任意可定位读取器的字节源适配
///
/// 构造时探测一次流长度，作为 `seek_forward` 的越界上限。
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    position: u64,
    len: u64,
}

impl<R: Read + Seek> ReaderSource<R> {
    /// 以读取器的当前位置为起点创建字节源
    pub fn new(mut reader: R) -> io::Result<Self> {
        let position = reader.stream_position()?;
        let len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(position))?;
        Ok(Self {
            reader,
            position,
            len,
        })
    }

    /// 当前读取位置（字节偏移）
    pub fn position(&self) -> u64 {
        self.position
    }

    /// 取回内部读取器
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> ByteSource for ReaderSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // std::io::Read 允许短读，这里循环直到读满或遇到EOF
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    // 出错前读入的字节已从读取器中消费
                    self.position += filled as u64;
                    return Err(e);
                }
            }
        }
        self.position += filled as u64;
        if filled < buf.len() {
            // 文件在构造后被截断时以实际位置为准
            self.len = self.position;
        }
        Ok(filled)
    }

    fn seek_forward(&mut self, num_bytes: u64) -> io::Result<()> {
        let target = self
            .position
            .checked_add(num_bytes)
            .filter(|&target| target <= self.len)
            .ok_or_else(|| seek_past_end_error(self.position, num_bytes, self.len))?;
        self.reader.seek(SeekFrom::Start(target))?;
        self.position = target;
        Ok(())
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.len
    }
}

/// 内存缓冲区字节源
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

impl ByteSource for SliceSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = &self.data[self.position..];
        let n = buf.len().min(available.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.position += n;
        Ok(n)
    }

    fn seek_forward(&mut self, num_bytes: u64) -> io::Result<()> {
        let remaining = (self.data.len() - self.position) as u64;
        if num_bytes > remaining {
            return Err(seek_past_end_error(
                self.position as u64,
                num_bytes,
                self.data.len() as u64,
            ));
        }
        self.position += num_bytes as usize;
        Ok(())
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.data.len()
    }
}

/// 打开/关闭字节源的能力
///
/// 高层解码流程通过它获得字节源，并保证每个成功打开的源恰好关闭一次。
pub trait SourceOpener {
    type Source: ByteSource;

    /// 打开字节源
    fn open(&mut self) -> io::Result<Self::Source>;

    /// 关闭字节源（消费所有权，关闭失败按I/O错误处理）
    fn close(&mut self, source: Self::Source) -> io::Result<()>;

    /// 用于日志的描述（通常为文件路径）
    fn describe(&self) -> String;
}

/// 基于文件路径的字节源打开器
#[derive(Debug, Clone)]
pub struct FileOpener {
    path: PathBuf,
}

impl FileOpener {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SourceOpener for FileOpener {
    type Source = ReaderSource<BufReader<File>>;

    fn open(&mut self) -> io::Result<Self::Source> {
        let file = File::open(&self.path)?;
        ReaderSource::new(BufReader::new(file))
    }

    fn close(&mut self, source: Self::Source) -> io::Result<()> {
        // 只读文件句柄在drop时释放，没有需要回写的缓冲
        drop(source);
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
