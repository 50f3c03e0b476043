//! 可移植的 RIFF/WAVE 解码器
//!
//! 解析WAV容器头部、遍历RIFF块结构，并将PCM/浮点样本流式解码到调用方提供的缓冲区，
//! 按需完成样本表示的升格与转换。
//!
//! ## 核心特性
//! - 与I/O后端解耦的字节源抽象（文件、内存、任意 `Read + Seek`）
//! - 小端/大端定宽整数与IEEE浮点编解码
//! - RIFF块遍历，未知块可交给自定义处理器
//! - 16位/32位整数PCM与32位浮点，含 WAVE_FORMAT_EXTENSIBLE
//! - 浮点→i32 饱和映射（NaN→0）
//! - 截断文件的优雅降级与"全有或全无"的资源清理

pub mod audio;
pub mod error;
pub mod processing;
pub mod tools;

// 重新导出核心类型
pub use audio::{
    ByteSource, DecodeOptions, DecodedWav, SampleFormat, WavDecodeInfo, WavFileDecoder, WavReader,
    read_16bit_wav_file, read_wav_file,
};
pub use error::{AudioError, AudioResult};
pub use processing::ChannelMap;
