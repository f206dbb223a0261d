//! Sprint reports and burndown forecasts.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use devops_hub_core::SprintTask;

use crate::{DONE_STATUS, SPRINT_DAYS};

const SEPARATOR_WIDTH: usize = 50;

fn is_done(task: &SprintTask) -> bool {
    task.status == DONE_STATUS
}

fn points(task: &SprintTask) -> f64 {
    task.story_points.unwrap_or(0.0)
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// Story points completed across `tasks`. This is the velocity of a closed sprint.
pub fn completed_points(tasks: &[SprintTask]) -> f64 {
    tasks.iter().filter(|t| is_done(t)).map(points).sum()
}

/// Totals of one sprint's tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct SprintSummary {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub total_points: f64,
    pub completed_points: f64,
    /// Points of the tasks not yet done.
    pub remaining_points: f64,
    /// Task count per status, in the order statuses first appear.
    pub status_counts: Vec<(String, usize)>,
}

impl SprintSummary {
    pub fn from_tasks(tasks: &[SprintTask]) -> Self {
        let mut status_counts: Vec<(String, usize)> = Vec::new();
        for task in tasks {
            match status_counts.iter_mut().find(|(s, _)| *s == task.status) {
                Some((_, count)) => *count += 1,
                None => status_counts.push((task.status.clone(), 1)),
            }
        }

        Self {
            total_tasks: tasks.len(),
            completed_tasks: tasks.iter().filter(|t| is_done(t)).count(),
            total_points: tasks.iter().map(points).sum(),
            completed_points: completed_points(tasks),
            remaining_points: tasks.iter().filter(|t| !is_done(t)).map(points).sum(),
            status_counts,
        }
    }

    /// Plain-text report as returned by the `generate_sprint_report` tool.
    pub fn render_report(&self, project_key: &str, sprint_id: u64) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Sprint Report for {} Sprint {}",
            project_key, sprint_id
        );
        let _ = writeln!(out, "{}", "=".repeat(SEPARATOR_WIDTH));
        let _ = writeln!(out, "Total Tasks: {}", self.total_tasks);
        let _ = writeln!(
            out,
            "Completed Tasks: {} ({:.1}%)",
            self.completed_tasks,
            percent(self.completed_tasks as f64, self.total_tasks as f64)
        );
        let _ = writeln!(out, "Total Story Points: {}", self.total_points);
        let _ = writeln!(
            out,
            "Completed Points: {} ({:.1}%)",
            self.completed_points,
            percent(self.completed_points, self.total_points)
        );
        out.push_str("\nTask Breakdown by Status:");
        for (status, count) in &self.status_counts {
            let _ = write!(out, "\n- {}: {}", status, count);
        }
        out
    }
}

/// Forecast of the points left when a sprint ends.
#[derive(Debug, Clone, PartialEq)]
pub struct BurndownForecast {
    pub total_points: f64,
    pub remaining_points: f64,
    /// Mean completed points of past sprints.
    pub average_velocity: f64,
    /// Whole days until the sprint ends, negative once it is overdue.
    pub days_remaining: i64,
    /// Unclamped prediction; zero or below means the sprint finishes in time.
    pub predicted_remaining: f64,
}

impl BurndownForecast {
    /// Forecast from the current sprint's tasks and the velocities of past sprints.
    pub fn compute(
        tasks: &[SprintTask],
        past_velocities: &[f64],
        end_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let summary = SprintSummary::from_tasks(tasks);
        let remaining_points = summary.remaining_points;

        let average_velocity = if past_velocities.is_empty() {
            0.0
        } else {
            past_velocities.iter().sum::<f64>() / past_velocities.len() as f64
        };

        let days_remaining = end_date
            .map(|end| (end - now).num_seconds().div_euclid(86_400))
            .unwrap_or(0);

        let predicted_remaining =
            remaining_points - average_velocity * days_remaining as f64 / SPRINT_DAYS;

        Self {
            total_points: summary.total_points,
            remaining_points,
            average_velocity,
            days_remaining,
            predicted_remaining,
        }
    }

    pub fn is_on_track(&self) -> bool {
        self.predicted_remaining <= 0.0
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_on_track() {
            "ON TRACK"
        } else {
            "AT RISK"
        }
    }

    /// Plain-text forecast as returned by the `predict_burndown` tool.
    pub fn render(&self, project_key: &str, sprint_id: u64) -> String {
        format!(
            "Burndown Prediction for {} Sprint {}\n\
             Total Points: {}\n\
             Remaining Points: {}\n\
             Average Team Velocity: {:.1} points/sprint\n\
             Days Remaining: {}\n\
             Predicted Points at Sprint End: {:.1}\n\
             Status: {}",
            project_key,
            sprint_id,
            self.total_points,
            self.remaining_points,
            self.average_velocity,
            self.days_remaining,
            self.predicted_remaining.max(0.0),
            self.status_label()
        )
    }
}
