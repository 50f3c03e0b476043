//! 解码后处理模块
//!
//! 声道映射/增益与样本归一化。这些步骤消费解码结果，不参与RIFF解析。

pub mod channel_map;
pub mod sample_conversion;

pub use channel_map::{ChannelMap, ChannelMapEntry, MAX_CHANNELS};
pub use sample_conversion::{NormalizedSample, channel_peaks, to_normalized_f32};
