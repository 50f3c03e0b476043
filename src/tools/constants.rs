//! 常量和默认配置集中管理

/// 并发度限制常量
pub mod parallel_limits {
    /// 最小并发度
    pub const MIN_PARALLEL_DEGREE: usize = 1;

    /// 最大并发度
    ///
    /// 每个并发会话各持有一个完整的样本缓冲区，并发度上限同时限制了峰值内存。
    pub const MAX_PARALLEL_DEGREE: usize = 16;
}

/// 表格输出常量
pub mod table {
    /// 峰值为零时显示的dB文本
    pub const SILENT_DB_TEXT: &str = "-inf";
}
