use crate::tasks::{TaskOutcome, TaskStatus};
use crate::utils::time::format_duration;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Colored terminal output, in the `[INFO]`/`[SUCCESS]`/`[WARNING]`/`[ERROR]`
/// prefix style the scanner has always used.
pub struct DisplayManager {
    use_colors: bool,
    quiet_mode: bool,
}

impl DisplayManager {
    pub fn new() -> Self {
        Self::with_quiet(false)
    }

    pub fn with_quiet(quiet: bool) -> Self {
        let use_colors = std::env::var("NO_COLOR").is_err()
            && std::env::var("TERM").map_or(true, |term| term != "dumb");

        Self {
            use_colors,
            quiet_mode: quiet,
        }
    }

    pub fn print_banner(&self, title: &str) {
        if self.quiet_mode {
            return;
        }
        let line = "=".repeat(50);
        println!("{}", line);
        println!("{:^50}", title);
        println!("{}", line);
    }

    pub fn print_status(&self, message: &str) {
        if self.quiet_mode {
            return;
        }
        if self.use_colors {
            println!("{} {}", "[INFO]".blue(), message);
        } else {
            println!("[INFO] {}", message);
        }
    }

    pub fn print_success(&self, message: &str) {
        if self.quiet_mode {
            return;
        }
        if self.use_colors {
            println!("{} {}", "[SUCCESS]".green(), message);
        } else {
            println!("[SUCCESS] {}", message);
        }
    }

    pub fn print_warning(&self, message: &str) {
        if self.quiet_mode {
            return;
        }
        if self.use_colors {
            println!("{} {}", "[WARNING]".yellow(), message);
        } else {
            println!("[WARNING] {}", message);
        }
    }

    pub fn print_error(&self, message: &str) {
        if self.use_colors {
            eprintln!("{} {}", "[ERROR]".red(), message);
        } else {
            eprintln!("[ERROR] {}", message);
        }
    }

    /// Spinner shown while an external tool runs.
    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        if self.quiet_mode {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    /// Print one finished task with a status-appropriate prefix.
    pub fn print_outcome(&self, outcome: &TaskOutcome) {
        let line = format!(
            "{} ({})",
            outcome.summary(),
            format_duration(outcome.duration)
        );
        match outcome.status {
            TaskStatus::Completed => self.print_success(&line),
            TaskStatus::Skipped { .. } => self.print_warning(&line),
            TaskStatus::Failed(_) | TaskStatus::TimedOut(_) => self.print_error(&line),
        }
    }

    /// Closing summary after a `run_all` session.
    pub fn print_session_summary(&self, outcomes: &[TaskOutcome]) {
        if self.quiet_mode {
            return;
        }

        let completed = outcomes
            .iter()
            .filter(|o| o.status == TaskStatus::Completed)
            .count();
        let skipped = outcomes
            .iter()
            .filter(|o| matches!(o.status, TaskStatus::Skipped { .. }))
            .count();
        let failed = outcomes.len() - completed - skipped;

        println!();
        self.print_status(&format!(
            "{} completed, {} skipped, {} failed of {} tasks",
            completed,
            skipped,
            failed,
            outcomes.len()
        ));
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}
