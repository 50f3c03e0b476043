//! 工具函数模块
//!
//! 提供音频值转换、文件路径处理与并发度计算等通用工具函数。

use super::constants::parallel_limits::{MAX_PARALLEL_DEGREE, MIN_PARALLEL_DEGREE};

/// 音频值转换工具函数
pub mod audio {
    use crate::tools::constants::table::SILENT_DB_TEXT;

    /// 将线性值转换为dB值（非正值为负无穷）
    #[inline]
    pub fn linear_to_db(value: f64) -> f64 {
        if value > 0.0 {
            20.0 * value.log10()
        } else {
            -f64::INFINITY
        }
    }

    /// 将dB值格式化为表格文本
    #[inline]
    pub fn format_db(db: f64) -> String {
        if db.is_finite() {
            format!("{db:.2}")
        } else {
            SILENT_DB_TEXT.to_string()
        }
    }
}

/// 文件路径处理工具函数
pub mod path {
    use std::path::Path;

    /// 提取文件名（返回String，用于日志显示）
    #[inline]
    pub fn extract_filename_lossy(path: &Path) -> String {
        path.file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}

/// 计算实际并发度
///
/// 限制在 `[MIN_PARALLEL_DEGREE, MAX_PARALLEL_DEGREE]` 内，且不超过文件数。
pub fn effective_parallel_degree(requested: usize, file_count: usize) -> usize {
    requested
        .clamp(MIN_PARALLEL_DEGREE, MAX_PARALLEL_DEGREE)
        .min(file_count.max(MIN_PARALLEL_DEGREE))
}

pub use audio::{format_db, linear_to_db};
pub use path::extract_filename_lossy;
