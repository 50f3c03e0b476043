//! 统一错误处理框架
//!
//! WAV解码管线的错误类型定义。所有失败都通过 [`AudioResult`] 显式返回，
//! 不存在需要调用方额外检查的"粘性错误标志"。

use std::fmt;
use std::io;

/// 解码相关的统一错误类型
#[derive(Debug)]
pub enum AudioError {
    /// 调用方参数无效（在任何I/O之前检查）
    InvalidArgument(String),

    /// 字节源无法打开/关闭，或底层读取失败
    IoError(io::Error),

    /// RIFF前导缺失、块顺序/长度不一致、在data块之前截断
    MalformedHeader(String),

    /// 解码器未实现的样本编码
    UnsupportedFormat(String),

    /// 输出缓冲区分配失败
    OutOfMemory {
        /// 请求分配的字节数
        requested_bytes: u64,
    },
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::InvalidArgument(msg) => write!(f, "参数无效: {msg}"),
            AudioError::IoError(err) => write!(f, "文件I/O错误: {err}"),
            AudioError::MalformedHeader(msg) => write!(f, "WAV头部损坏: {msg}"),
            AudioError::UnsupportedFormat(msg) => write!(f, "不支持的WAV格式: {msg}"),
            AudioError::OutOfMemory { requested_bytes } => {
                write!(f, "内存不足: 无法分配 {requested_bytes} 字节的样本缓冲区")
            }
        }
    }
}

impl std::error::Error for AudioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AudioError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for AudioError {
    fn from(err: io::Error) -> Self {
        AudioError::IoError(err)
    }
}

/// 解码操作的标准Result类型
pub type AudioResult<T> = Result<T, AudioError>;

// ==================== 错误构造Helper函数 ====================
// 消除重复的 AudioError::XXX(format!(...)) 模式

/// 创建头部损坏错误的helper函数
#[inline]
pub fn malformed_header<E: fmt::Display>(context: &str, detail: E) -> AudioError {
    AudioError::MalformedHeader(format!("{context}: {detail}"))
}

/// 创建格式不支持错误的helper函数
#[inline]
pub fn unsupported_format<E: fmt::Display>(context: &str, detail: E) -> AudioError {
    AudioError::UnsupportedFormat(format!("{context}: {detail}"))
}

/// 创建参数无效错误的helper函数
#[inline]
pub fn invalid_argument<E: fmt::Display>(context: &str, detail: E) -> AudioError {
    AudioError::InvalidArgument(format!("{context}: {detail}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_contains_context() {
        let err = malformed_header("缺少RIFF前导", "前4字节为 \"RIFX\"");
        assert!(err.to_string().contains("缺少RIFF前导"));
        assert!(err.to_string().contains("RIFX"));
    }

    #[test]
    fn test_io_error_exposes_source() {
        let err: AudioError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, AudioError::IoError(_)));
        assert!(err.source().is_some());

        let err = unsupported_format("位深度", 24);
        assert!(err.source().is_none());
    }

    #[test]
    fn test_out_of_memory_reports_size() {
        let err = AudioError::OutOfMemory {
            requested_bytes: 4096,
        };
        assert!(err.to_string().contains("4096"));
    }
}
