//! WAV解码模块
//!
//! 数据自底向上流动：字节源 → 块遍历 → 格式解析（`fmt `）/ 样本解码（`data`），
//! 由 [`WavFileDecoder`] 编排整个流程并持有最终输出缓冲区。

pub mod byte_source;
pub mod chunk;
pub mod endian;
pub mod format;
pub mod sample_decoder;
pub mod wav_decoder;

pub use byte_source::{ByteSource, FileOpener, ReaderSource, SliceSource, SourceOpener};
pub use chunk::{ChunkHandler, ChunkId, ChunkKind, ChunkPayload, ChunkWalker, read_wav_header};
pub use format::{FormatDescriptor, FormatTag, SampleFormat, WavDecodeInfo, resolve_format_chunk};
pub use sample_decoder::{WavReader, float_to_i32, read_i16_samples, read_i32_samples};
pub use wav_decoder::{
    DecodeOptions, DecodedWav, OutputSample, WavFileDecoder, read_16bit_wav_file, read_wav_file,
};
