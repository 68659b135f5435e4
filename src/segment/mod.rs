//! Client side of the external word segmentation tool.
//!
//! The tool takes a comma-joined list of files as its last argument and writes the
//! segmented text to stdout: one output line per input line, files in the order
//! given. [`Segmenter::segment`] cuts that output back into one chunk per file.

use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Segmenter exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

#[derive(Debug, Clone)]
pub struct Segmenter {
    program: PathBuf,
    args: Vec<String>,
}

impl Segmenter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments placed before the file list.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub async fn segment(&self, files: &[PathBuf]) -> Result<Vec<Vec<String>>, SegmentError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let mut line_counts = Vec::with_capacity(files.len());
        for file in files {
            line_counts.push(count_lines(file).await?);
        }

        let joined = files
            .iter()
            .map(|file| file.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(",");
        debug!("Segmenting {} files with {}", files.len(), self.program.display());

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&joined)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| SegmentError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(SegmentError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(split_by_counts(&stdout, &line_counts))
    }
}

async fn count_lines(path: &Path) -> Result<usize, SegmentError> {
    let content = tokio::fs::read(path).await?;
    Ok(line_count(&content))
}

/// Lines in raw file content, whatever its encoding. A final line without a
/// trailing newline still counts.
fn line_count(content: &[u8]) -> usize {
    let newlines = content.iter().filter(|&&byte| byte == b'\n').count();
    match content.last() {
        Some(&last) if last != b'\n' => newlines + 1,
        _ => newlines,
    }
}

/// Splits newline-delimited `output` into consecutive chunks of `counts[i]` lines.
/// Chunks come up short when the output runs out.
pub fn split_by_counts(output: &str, counts: &[usize]) -> Vec<Vec<String>> {
    let mut lines = output.split('\n');
    let chunks: Vec<Vec<String>> = counts
        .iter()
        .map(|&count| lines.by_ref().take(count).map(str::to_string).collect())
        .collect();

    let leftover = lines.filter(|line| !line.is_empty()).count();
    if leftover > 0 {
        warn!("Segmenter produced {} unexpected trailing lines", leftover);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_by_counts() {
        let chunks = split_by_counts("a b\nc\nd e f\ng\n", &[2, 1, 1]);
        assert_eq!(
            chunks,
            vec![
                vec!["a b".to_string(), "c".to_string()],
                vec!["d e f".to_string()],
                vec!["g".to_string()],
            ]
        );
    }

    #[test]
    fn test_split_short_output() {
        let chunks = split_by_counts("only\n", &[1, 2]);
        assert_eq!(chunks[0], vec!["only".to_string()]);
        assert_eq!(chunks[1], vec![String::new()]);
    }

    #[tokio::test]
    async fn test_segment_keeps_file_order() {
        let tmp = tempfile::tempdir().unwrap();
        let first = tmp.path().join("first.txt");
        let second = tmp.path().join("second.txt");
        std::fs::write(&first, "你好 世界\n再见\n").unwrap();
        std::fs::write(&second, "一 二 三\n").unwrap();

        // Stand-in tool: prints the files in the order given.
        let segmenter = Segmenter::new("sh").with_args(vec![
            "-c".to_string(),
            r#"IFS=,; for f in $1; do cat "$f"; done"#.to_string(),
            "segment".to_string(),
        ]);

        let chunks = segmenter.segment(&[first, second]).await.unwrap();
        assert_eq!(
            chunks,
            vec![
                vec!["你好 世界".to_string(), "再见".to_string()],
                vec!["一 二 三".to_string()],
            ]
        );
    }

    #[test]
    fn test_line_count() {
        assert_eq!(line_count(b""), 0);
        assert_eq!(line_count(b"a\nb\n"), 2);
        assert_eq!(line_count(b"a\nb"), 2);
        assert_eq!(line_count(b"\n\n"), 2);
    }

    #[tokio::test]
    async fn test_segment_non_utf8_input() {
        let tmp = tempfile::tempdir().unwrap();
        let latin1 = tmp.path().join("latin1.srt");
        let plain = tmp.path().join("plain.srt");
        std::fs::write(&latin1, b"caf\xe9\nna\xefve\n").unwrap();
        std::fs::write(&plain, "ok\n").unwrap();

        let segmenter = Segmenter::new("sh").with_args(vec![
            "-c".to_string(),
            r#"IFS=,; for f in $1; do cat "$f"; done"#.to_string(),
            "segment".to_string(),
        ]);

        let chunks = segmenter.segment(&[latin1, plain]).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 2);
        assert!(chunks[0][0].starts_with("caf"));
        assert_eq!(chunks[1], vec!["ok".to_string()]);
    }

    #[tokio::test]
    async fn test_segment_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("input.txt");
        std::fs::write(&file, "x\n").unwrap();

        let result = Segmenter::new("false").segment(&[file]).await;
        assert!(matches!(result, Err(SegmentError::Failed { .. })));
    }

    #[tokio::test]
    async fn test_segment_nothing() {
        let chunks = Segmenter::new("false").segment(&[]).await.unwrap();
        assert!(chunks.is_empty());
    }
}
