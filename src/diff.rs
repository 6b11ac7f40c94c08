//! src/diff.rs

pub const MAX_DIFF_LINES: usize = 1000;
pub const TRUNCATION_MARKER: &str = "... [diff truncated]";

/// 截断后的 diff 文本以及增删行数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSummary {
    pub text: String,
    pub added_lines: i64,
    pub removed_lines: i64,
    pub truncated: bool,
}

impl DiffSummary {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// 按行前缀统计增删行数并截断到 `MAX_DIFF_LINES` 行。
///
/// 计数基于完整的 diff，而不是截断后的文本。这只是文本层面的近似，
/// 不识别重命名或二进制文件。
pub fn summarize_diff(raw: &str) -> DiffSummary {
    let mut added_lines = 0;
    let mut removed_lines = 0;
    for line in raw.lines() {
        if line.starts_with('+') && !line.starts_with("+++") {
            added_lines += 1;
        } else if line.starts_with('-') && !line.starts_with("---") {
            removed_lines += 1;
        }
    }

    let line_count = raw.lines().count();
    let (text, truncated) = if line_count > MAX_DIFF_LINES {
        let mut kept: Vec<&str> = raw.lines().take(MAX_DIFF_LINES).collect();
        kept.push(TRUNCATION_MARKER);
        (kept.join("\n"), true)
    } else {
        (raw.to_string(), false)
    };

    DiffSummary {
        text,
        added_lines,
        removed_lines,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "diff --git a/src/lib.rs b/src/lib.rs
index 1111111..2222222 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,3 +1,4 @@
-fn old() {}
+fn new() {}
+fn another() {}
 fn untouched() {}
";

    #[test]
    fn counts_ignore_file_headers() {
        let summary = summarize_diff(SAMPLE);
        assert_eq!(summary.added_lines, 2);
        assert_eq!(summary.removed_lines, 1);
        assert!(!summary.truncated);
        assert_eq!(summary.text, SAMPLE);
    }

    #[test]
    fn content_lines_that_look_like_headers_are_not_counted() {
        // "++++" 也以 "+++" 开头，按前缀规则不计入
        let diff = "++++ weird\n+ok\n---- weird\n-gone\n";
        let summary = summarize_diff(diff);
        assert_eq!(summary.added_lines, 1);
        assert_eq!(summary.removed_lines, 1);
    }

    #[test]
    fn empty_diff() {
        let summary = summarize_diff("");
        assert!(summary.is_empty());
        assert_eq!(summary.added_lines, 0);
        assert_eq!(summary.removed_lines, 0);
    }

    #[test]
    fn exactly_the_limit_is_unchanged() {
        let diff: String = (0..MAX_DIFF_LINES).map(|i| format!("+line {i}\n")).collect();
        let summary = summarize_diff(&diff);
        assert!(!summary.truncated);
        assert_eq!(summary.text, diff);
        assert_eq!(summary.added_lines, MAX_DIFF_LINES as i64);
    }

    #[test]
    fn long_diff_is_truncated_with_marker() {
        let diff: String = (0..MAX_DIFF_LINES + 250)
            .map(|i| format!("-line {i}\n"))
            .collect();
        let summary = summarize_diff(&diff);

        assert!(summary.truncated);
        let lines: Vec<&str> = summary.text.lines().collect();
        assert_eq!(lines.len(), MAX_DIFF_LINES + 1);
        assert_eq!(lines[MAX_DIFF_LINES - 1], format!("-line {}", MAX_DIFF_LINES - 1));
        assert_eq!(lines[MAX_DIFF_LINES], TRUNCATION_MARKER);
        // 计数覆盖整个 diff
        assert_eq!(summary.removed_lines, (MAX_DIFF_LINES + 250) as i64);
    }
}
