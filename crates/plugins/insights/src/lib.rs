//! Analysis helpers for mcp-devops-hub.
//!
//! Pure computations over data the integrations fetch:
//! - [`sprint`] - sprint reports and burndown forecasts
//! - [`quality`] - line-based code quality metrics
//! - [`truncation`] - bounded text for LLM prompts

pub mod quality;
pub mod sprint;
pub mod truncation;

pub use quality::{language_from_path, render_directory_summary, CodeMetrics, CommentStyle};
pub use sprint::{completed_points, BurndownForecast, SprintSummary};
pub use truncation::{truncate_string, MAX_ANALYSIS_CHARS};

/// Comment lines per total line below which more comments are recommended.
pub const MIN_COMMENT_RATIO: f64 = 0.1;

/// Branching lines above which the code is considered too complex.
pub const MAX_COMPLEXITY: usize = 10;

/// Working days in a sprint.
pub const SPRINT_DAYS: f64 = 10.0;

/// Status name of a finished task.
pub const DONE_STATUS: &str = "Done";
