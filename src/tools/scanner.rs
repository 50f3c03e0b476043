//! 文件扫描模块
//!
//! 将命令行输入展开为待解码的WAV文件列表：文件原样保留，目录按扩展名扫描。

use crate::error::{self, AudioError, AudioResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 目录扫描时接受的扩展名
const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "wave"];

fn has_wav_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// 扫描单个目录中的WAV文件（按路径排序）
pub fn scan_directory(dir_path: &Path, recursive: bool) -> AudioResult<Vec<PathBuf>> {
    if !dir_path.is_dir() {
        return Err(error::invalid_argument(
            "路径不是目录",
            dir_path.display(),
        ));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut wav_files = Vec::new();
    for entry in WalkDir::new(dir_path).max_depth(max_depth) {
        let entry = entry.map_err(|e| {
            AudioError::IoError(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::other(format!("目录遍历失败: {}", dir_path.display()))
            }))
        })?;
        if entry.file_type().is_file() && has_wav_extension(entry.path()) {
            wav_files.push(entry.into_path());
        }
    }

    wav_files.sort();
    Ok(wav_files)
}

/// 展开所有输入路径
///
/// 显式给出的文件不检查扩展名；不存在的路径返回 `IoError`。
pub fn scan_wav_files(inputs: &[PathBuf], recursive: bool) -> AudioResult<Vec<PathBuf>> {
    let mut wav_files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let found = scan_directory(input, recursive)?;
            log::debug!("目录 {} 中找到 {} 个WAV文件", input.display(), found.len());
            wav_files.extend(found);
        } else if input.exists() {
            wav_files.push(input.clone());
        } else {
            return Err(AudioError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("路径不存在: {}", input.display()),
            )));
        }
    }
    Ok(wav_files)
}
