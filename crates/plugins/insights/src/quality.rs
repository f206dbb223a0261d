//! Line-based code quality metrics.

use std::fmt::Write as _;

use crate::{MAX_COMPLEXITY, MIN_COMMENT_RATIO};

/// Line comment syntax of a source file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `#` comments: Python, shell, Ruby, YAML, TOML...
    Hash,
    /// `//` comments: Rust, C family, JavaScript, Go, Java...
    Slash,
}

const HASH_BRANCH_KEYWORDS: &[&str] = &["if", "elif", "for", "while", "except", "def", "class"];

const SLASH_BRANCH_KEYWORDS: &[&str] = &[
    "if", "for", "while", "catch", "case", "switch", "match", "fn", "function", "func", "class",
];

impl CommentStyle {
    pub fn from_path(path: &str) -> Self {
        match language_from_path(path).to_ascii_lowercase().as_str() {
            "rs" | "c" | "h" | "cc" | "cpp" | "cxx" | "hpp" | "cs" | "java" | "kt" | "kts"
            | "scala" | "go" | "js" | "jsx" | "mjs" | "ts" | "tsx" | "swift" | "dart" | "php"
            | "groovy" | "proto" => CommentStyle::Slash,
            _ => CommentStyle::Hash,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            CommentStyle::Hash => "#",
            CommentStyle::Slash => "//",
        }
    }

    fn branch_keywords(self) -> &'static [&'static str] {
        match self {
            CommentStyle::Hash => HASH_BRANCH_KEYWORDS,
            CommentStyle::Slash => SLASH_BRANCH_KEYWORDS,
        }
    }
}

/// Language tag of a file: the text after the last `.` of its name, or `text`.
pub fn language_from_path(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext,
        _ => "text",
    }
}

fn has_keyword(line: &str, keywords: &[&str]) -> bool {
    line.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|word| keywords.contains(&word))
}

/// Metrics of one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeMetrics {
    pub total_lines: usize,
    pub code_lines: usize,
    pub comment_lines: usize,
    /// Lines containing a branching keyword.
    pub complexity: usize,
}

impl CodeMetrics {
    pub fn analyze(code: &str, style: CommentStyle) -> Self {
        let prefix = style.prefix();
        let keywords = style.branch_keywords();

        let mut metrics = CodeMetrics {
            total_lines: 0,
            code_lines: 0,
            comment_lines: 0,
            complexity: 0,
        };

        for line in code.lines() {
            metrics.total_lines += 1;
            let trimmed = line.trim();
            if trimmed.starts_with(prefix) {
                metrics.comment_lines += 1;
                continue;
            }
            if !trimmed.is_empty() {
                metrics.code_lines += 1;
            }
            if has_keyword(trimmed, keywords) {
                metrics.complexity += 1;
            }
        }

        metrics
    }

    /// Comment lines per total line, 0 for an empty file.
    pub fn comment_ratio(&self) -> f64 {
        if self.total_lines == 0 {
            0.0
        } else {
            self.comment_lines as f64 / self.total_lines as f64
        }
    }

    pub fn needs_more_comments(&self) -> bool {
        self.comment_ratio() < MIN_COMMENT_RATIO
    }

    pub fn is_too_complex(&self) -> bool {
        self.complexity > MAX_COMPLEXITY
    }

    /// Plain-text report as returned by the `assess_code_quality` tool.
    pub fn render_report(&self, path: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Code Quality Assessment for {}", path);
        let _ = writeln!(out, "================================");
        let _ = writeln!(out, "Total Lines: {}", self.total_lines);
        let _ = writeln!(out, "Lines of Code: {}", self.code_lines);
        let _ = writeln!(out, "Comment Lines: {}", self.comment_lines);
        let _ = writeln!(out, "Comment Ratio: {:.1}%", self.comment_ratio() * 100.0);
        let _ = writeln!(out, "Cyclomatic Complexity: {}", self.complexity);
        out.push_str("\nRecommendations:\n");
        let _ = writeln!(
            out,
            "- {}",
            if self.needs_more_comments() {
                "Add more comments"
            } else {
                "Comment ratio is good"
            }
        );
        let _ = write!(
            out,
            "- {}",
            if self.is_too_complex() {
                "Consider breaking down complex logic"
            } else {
                "Complexity is acceptable"
            }
        );
        out
    }
}

/// Summary for a directory path, which has no line metrics.
pub fn render_directory_summary(path: &str, entry_count: usize) -> String {
    format!(
        "Directory Summary for {}\nTotal files: {}\nUse specific file paths for detailed analysis",
        path, entry_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const PYTHON: &str = "# Utility module\n\
        import os\n\
        \n\
        def classify(value):\n    \
            # positive or not\n    \
            if value > 0:\n        \
                return 'positive'\n    \
            return 'other'\n";

    #[test]
    fn test_language_from_path() {
        assert_eq!(language_from_path("src/main.rs"), "rs");
        assert_eq!(language_from_path("app/archive.tar.gz"), "gz");
        assert_eq!(language_from_path("Makefile"), "text");
        assert_eq!(language_from_path("v1.2/README"), "text");
        assert_eq!(language_from_path("trailing."), "text");
    }

    #[test]
    fn test_comment_style_from_path() {
        assert_eq!(CommentStyle::from_path("lib/util.py"), CommentStyle::Hash);
        assert_eq!(CommentStyle::from_path("src/lib.rs"), CommentStyle::Slash);
        assert_eq!(CommentStyle::from_path("web/App.TSX"), CommentStyle::Slash);
        assert_eq!(CommentStyle::from_path("LICENSE"), CommentStyle::Hash);
    }

    #[test]
    fn test_analyze_python() {
        let metrics = CodeMetrics::analyze(PYTHON, CommentStyle::Hash);

        assert_eq!(metrics.total_lines, 8);
        assert_eq!(metrics.comment_lines, 2);
        assert_eq!(metrics.code_lines, 5);
        // `def` and `if`
        assert_eq!(metrics.complexity, 2);
        assert_eq!(metrics.comment_ratio(), 0.25);
        assert!(!metrics.needs_more_comments());
    }

    #[test]
    fn test_keywords_match_whole_words() {
        let code = "let diff = 1;\nlet format = 2;\nif diff > format { }\n";
        let metrics = CodeMetrics::analyze(code, CommentStyle::Slash);
        assert_eq!(metrics.complexity, 1);
    }

    #[test]
    fn test_slash_comments() {
        let code = "// header\nfn main() {\n    // body\n    println!(\"#not a comment\");\n}\n";
        let metrics = CodeMetrics::analyze(code, CommentStyle::Slash);
        assert_eq!(metrics.comment_lines, 2);
        assert_eq!(metrics.code_lines, 3);
        assert_eq!(metrics.complexity, 1);
    }

    #[test]
    fn test_empty_file() {
        let metrics = CodeMetrics::analyze("", CommentStyle::Hash);
        assert_eq!(metrics.total_lines, 0);
        assert_eq!(metrics.comment_ratio(), 0.0);
        assert!(metrics.needs_more_comments());
    }

    #[test]
    fn test_complex_code_recommendation() {
        let code = "if a:\n    pass\n".repeat(11);
        let metrics = CodeMetrics::analyze(&code, CommentStyle::Hash);
        assert_eq!(metrics.complexity, 11);
        assert!(metrics.is_too_complex());

        let report = metrics.render_report("big.py");
        assert!(report.contains("- Add more comments"));
        assert!(report.ends_with("- Consider breaking down complex logic"));
    }

    #[test]
    fn test_render_report() {
        let report = CodeMetrics::analyze(PYTHON, CommentStyle::Hash).render_report("util.py");

        let expected = "Code Quality Assessment for util.py\n\
            ================================\n\
            Total Lines: 8\n\
            Lines of Code: 5\n\
            Comment Lines: 2\n\
            Comment Ratio: 25.0%\n\
            Cyclomatic Complexity: 2\n\
            \n\
            Recommendations:\n\
            - Comment ratio is good\n\
            - Complexity is acceptable";
        assert_eq!(report, expected);
    }

    #[test]
    fn test_directory_summary() {
        assert_eq!(
            render_directory_summary("src", 4),
            "Directory Summary for src\nTotal files: 4\n\
             Use specific file paths for detailed analysis"
        );
    }
}
