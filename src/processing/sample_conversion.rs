//! 样本格式转换
//!
//! 将解码得到的整数样本归一化为 [-1.0, 1.0) 的 f32，并提供逐声道峰值统计。

use crate::audio::sample_decoder::FLOAT_TO_INT32_SCALE;

/// i16 满量程
const I16_FULL_SCALE: f32 = 32768.0;


/// 可归一化为 f32 的整数样本
pub trait NormalizedSample: Copy {
    fn to_normalized_f32(self) -> f32;
}

impl NormalizedSample for i16 {
    #[inline]
    fn to_normalized_f32(self) -> f32 {
        f32::from(self) / I16_FULL_SCALE
    }
}

impl NormalizedSample for i32 {
    #[inline]
    fn to_normalized_f32(self) -> f32 {
        // 经f64计算，避免大整数直接转f32的舍入
        (f64::from(self) / FLOAT_TO_INT32_SCALE) as f32
    }
}

/// 批量归一化
pub fn to_normalized_f32<T: NormalizedSample>(samples: &[T]) -> Vec<f32> {
    samples.iter().map(|&s| s.to_normalized_f32()).collect()
}

/// 交错样本的逐声道绝对峰值
pub fn channel_peaks(interleaved: &[f32], num_channels: usize) -> Vec<f32> {
    let mut peaks = vec![0.0f32; num_channels];
    if num_channels == 0 {
        return peaks;
    }
    for frame in interleaved.chunks_exact(num_channels) {
        for (peak, &sample) in peaks.iter_mut().zip(frame) {
            *peak = peak.max(sample.abs());
        }
    }
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_full_scale() {
        assert_eq!(i16::MIN.to_normalized_f32(), -1.0);
        assert_eq!(0i16.to_normalized_f32(), 0.0);
        assert_eq!(16384i16.to_normalized_f32(), 0.5);
        assert_eq!(i32::MIN.to_normalized_f32(), -1.0);
        assert_eq!(1_073_741_824i32.to_normalized_f32(), 0.5);
        assert!(i32::MAX.to_normalized_f32() <= 1.0);
    }

    #[test]
    fn test_channel_peaks() {
        let samples = [0.1f32, -0.8, -0.5, 0.2, 0.3, 0.0, 0.9];
        // 末尾残缺帧不计入
        assert_eq!(channel_peaks(&samples, 2), vec![0.5, 0.8]);
        assert_eq!(channel_peaks(&samples, 0), Vec::<f32>::new());
        assert_eq!(to_normalized_f32(&[16384i16, -32768]), vec![0.5, -1.0]);
    }
}
