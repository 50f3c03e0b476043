//! 输出格式化模块
//!
//! 将逐文件的处理结果渲染为终端表格或JSON。

use super::processor::{FileOutcome, FileReport};
use super::utils;
use crate::error::{AudioError, AudioResult};
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;

const TABLE_HEADER: [&str; 8] = [
    "文件",
    "声道",
    "采样率(Hz)",
    "样本数",
    "时长(s)",
    "位宽",
    "峰值(dBFS)",
    "状态",
];

fn right(text: impl ToString) -> Cell {
    Cell::new(text.to_string()).set_alignment(CellAlignment::Right)
}

fn report_row(name: String, report: &FileReport) -> Vec<Cell> {
    let peaks = report
        .peak_dbfs
        .iter()
        .map(|&db| utils::format_db(db))
        .collect::<Vec<_>>()
        .join(" / ");
    vec![
        Cell::new(name),
        right(report.num_channels),
        right(report.sample_rate_hz),
        right(report.sample_count),
        right(format!("{:.3}", report.duration_seconds)),
        right(report.output_bits),
        Cell::new(peaks),
        Cell::new("✅"),
    ]
}

fn error_row(name: String, error: &AudioError) -> Vec<Cell> {
    let mut row = vec![Cell::new(name)];
    row.extend((0..6).map(|_| right("-")));
    row.push(Cell::new(format!("❌ {error}")));
    row
}

/// 统计成功/失败的文件数
pub fn count_outcomes(outcomes: &[FileOutcome]) -> (usize, usize) {
    let succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count();
    (succeeded, outcomes.len() - succeeded)
}

/// 渲染为终端表格（附带汇总行）
pub fn render_table(outcomes: &[FileOutcome]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(TABLE_HEADER.to_vec());

    for outcome in outcomes {
        let name = utils::extract_filename_lossy(&outcome.path);
        table.add_row(match &outcome.result {
            Ok(report) => report_row(name, report),
            Err(e) => error_row(name, e),
        });
    }

    let (succeeded, failed) = count_outcomes(outcomes);
    format!(
        "{table}\n共 {} 个文件：成功 {succeeded}，失败 {failed}\n",
        outcomes.len()
    )
}

/// JSON输出条目；负无穷峰值序列化为 `null`
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum JsonEntry<'a> {
    Ok(&'a FileReport),
    Error { path: String, error: String },
}

/// 渲染为JSON数组（顺序与输入一致）
pub fn render_json(outcomes: &[FileOutcome]) -> AudioResult<String> {
    let entries: Vec<JsonEntry<'_>> = outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(report) => JsonEntry::Ok(report),
            Err(e) => JsonEntry::Error {
                path: outcome.path.display().to_string(),
                error: e.to_string(),
            },
        })
        .collect();
    serde_json::to_string_pretty(&entries).map_err(|e| AudioError::IoError(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn outcomes() -> Vec<FileOutcome> {
        vec![
            FileOutcome {
                path: PathBuf::from("/music/ok.wav"),
                result: Ok(FileReport {
                    path: "/music/ok.wav".to_string(),
                    num_channels: 2,
                    sample_rate_hz: 44100,
                    sample_count: 88200,
                    num_frames: 44100,
                    duration_seconds: 1.0,
                    output_bits: 32,
                    peak_dbfs: vec![-6.0206, f64::NEG_INFINITY],
                }),
            },
            FileOutcome {
                path: PathBuf::from("/music/bad.wav"),
                result: Err(AudioError::UnsupportedFormat("24位PCM".to_string())),
            },
        ]
    }

    #[test]
    fn test_render_table() {
        let text = render_table(&outcomes());
        assert!(text.contains("ok.wav"));
        assert!(text.contains("44100"));
        assert!(text.contains("-6.02 / -inf"));
        assert!(text.contains("bad.wav"));
        assert!(text.contains("24位PCM"));
        assert!(text.contains("成功 1，失败 1"));
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&outcomes()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0]["status"], "ok");
        assert_eq!(entries[0]["sample_rate_hz"], 44100);
        assert_eq!(entries[0]["num_frames"], 44100);
        assert!(entries[0]["peak_dbfs"][1].is_null());

        assert_eq!(entries[1]["status"], "error");
        assert_eq!(entries[1]["path"], "/music/bad.wav");
        assert!(entries[1]["error"].as_str().unwrap().contains("24位PCM"));
    }
}
