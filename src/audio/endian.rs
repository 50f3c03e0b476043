//! 字节序编解码
//!
//! 在定长字节缓冲区与定宽整数/IEEE浮点之间进行小端、大端转换。
//! 全部为纯函数：无分配、无错误路径，缓冲区长度由类型系统保证（`[u8; N]`）。
//!
//! WAV 的整数 PCM 与头部字段均为小端；大端版本用于其他RIFF变体（RIFX）及序列化场景。

/// 🔧 为一个定宽类型生成四个读写函数
///
/// 浮点的 `from_*_bytes`/`to_*_bytes` 按位转换，
/// NaN 载荷、负零和次正规数的位模式原样往返。
macro_rules! endian_codec {
    ($ty:ty, $width:expr, $le_read:ident, $le_write:ident, $be_read:ident, $be_write:ident) => {
        #[doc = concat!("从小端字节读取 `", stringify!($ty), "`")]
        #[inline]
        pub fn $le_read(bytes: &[u8; $width]) -> $ty {
            <$ty>::from_le_bytes(*bytes)
        }

        #[doc = concat!("将 `", stringify!($ty), "` 以小端写入字节缓冲区")]
        #[inline]
        pub fn $le_write(value: $ty, bytes: &mut [u8; $width]) {
            *bytes = value.to_le_bytes();
        }

        #[doc = concat!("从大端字节读取 `", stringify!($ty), "`")]
        #[inline]
        pub fn $be_read(bytes: &[u8; $width]) -> $ty {
            <$ty>::from_be_bytes(*bytes)
        }

        #[doc = concat!("将 `", stringify!($ty), "` 以大端写入字节缓冲区")]
        #[inline]
        pub fn $be_write(value: $ty, bytes: &mut [u8; $width]) {
            *bytes = value.to_be_bytes();
        }
    };
}

endian_codec!(
    u16,
    2,
    little_endian_read_u16,
    little_endian_write_u16,
    big_endian_read_u16,
    big_endian_write_u16
);
endian_codec!(
    u32,
    4,
    little_endian_read_u32,
    little_endian_write_u32,
    big_endian_read_u32,
    big_endian_write_u32
);
endian_codec!(
    u64,
    8,
    little_endian_read_u64,
    little_endian_write_u64,
    big_endian_read_u64,
    big_endian_write_u64
);
endian_codec!(
    i16,
    2,
    little_endian_read_i16,
    little_endian_write_i16,
    big_endian_read_i16,
    big_endian_write_i16
);
endian_codec!(
    i32,
    4,
    little_endian_read_i32,
    little_endian_write_i32,
    big_endian_read_i32,
    big_endian_write_i32
);
endian_codec!(
    i64,
    8,
    little_endian_read_i64,
    little_endian_write_i64,
    big_endian_read_i64,
    big_endian_write_i64
);
endian_codec!(
    f32,
    4,
    little_endian_read_f32,
    little_endian_write_f32,
    big_endian_read_f32,
    big_endian_write_f32
);
endian_codec!(
    f64,
    8,
    little_endian_read_f64,
    little_endian_write_f64,
    big_endian_read_f64,
    big_endian_write_f64
);

/// 从切片的 `offset` 处取出定长数组
///
/// 剩余不足 `N` 字节时返回 `None`，供头部解析这类长度来自文件的场景使用。
#[inline]
pub fn take_array<const N: usize>(bytes: &[u8], offset: usize) -> Option<[u8; N]> {
    bytes
        .get(offset..offset.checked_add(N)?)
        .and_then(|slice| slice.try_into().ok())
}
