//! Terminal output: a spinner that follows the machine, and coloured summaries.

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::report::{EventCreationReport, Status};
use crate::social::{SocialPostResult, promotion_summary};
use crate::state_machine::{Checkpoint, EventState, MachineObserver, MachineResult};

/// Spinner showing the platform and state currently being worked on.
pub struct RunProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl RunProgress {
    pub fn start(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl MachineObserver for RunProgress {
    fn state_entered(&self, platform: &str, state: EventState) {
        self.pb.set_message(format!("{platform}: {state}"));
    }

    fn retry_scheduled(
        &self,
        platform: &str,
        state: EventState,
        attempt: u32,
        delay: Duration,
        error: &str,
    ) {
        self.pb.println(format!(
            "  {} {platform} {state} retry {attempt}/{} in {:.1}s: {error}",
            self.yellow.apply_to("↻"),
            state.config().max_retries,
            delay.as_secs_f64()
        ));
    }

    fn state_abandoned(&self, platform: &str, state: EventState, next: EventState, error: &str) {
        self.pb.println(format!(
            "  {} {platform} {state} -> {next}: {error}",
            self.red.apply_to("✗")
        ));
    }

    fn run_finished(&self, platform: &str, result: &MachineResult) {
        let style = status_style(result.status, &self.green, &self.red, &self.yellow);
        self.pb.println(format!(
            "  {} {platform}: {}",
            style.apply_to(status_mark(result.status)),
            style.apply_to(result.status)
        ));
    }
}

fn status_mark(status: Status) -> &'static str {
    match status {
        s if s.is_ok() => "✓",
        Status::Failed => "✗",
        _ => "•",
    }
}

fn status_style<'s>(status: Status, green: &'s Style, red: &'s Style, yellow: &'s Style) -> &'s Style {
    match status {
        s if s.is_ok() => green,
        Status::Failed => red,
        _ => yellow,
    }
}

pub fn print_report(report: &EventCreationReport) {
    let (green, red, yellow) = (Style::new().green(), Style::new().red(), Style::new().yellow());
    let bold = Style::new().bold();

    println!();
    println!("{}", bold.apply_to("─── Event Creation ───"));
    for r in &report.results {
        let style = status_style(r.status, &green, &red, &yellow);
        let detail = if !r.url.is_empty() { &r.url } else { &r.error };
        println!(
            "  {} {:<10} {:<12} {detail}",
            style.apply_to(status_mark(r.status)),
            r.platform,
            style.apply_to(r.status)
        );
    }
    println!("  {}", bold.apply_to(&report.summary));
    if !report.primary_url.is_empty() {
        println!("  Primary URL: {}", green.apply_to(&report.primary_url));
    }
    println!();
    println!("{}", serde_json::to_string_pretty(report).unwrap_or_default());
}

pub fn print_social(results: &[SocialPostResult]) {
    let (green, red, yellow) = (Style::new().green(), Style::new().red(), Style::new().yellow());

    println!();
    println!("{}", Style::new().bold().apply_to("─── Social Promotion ───"));
    for r in results {
        let style = status_style(r.status, &green, &red, &yellow);
        let detail = if !r.post_url.is_empty() { &r.post_url } else { &r.error };
        println!(
            "  {} {:<10} {:<8} {detail}",
            style.apply_to(status_mark(r.status)),
            r.platform,
            style.apply_to(r.status)
        );
    }
    println!("  {}", promotion_summary(results));
    println!();
    println!("{}", serde_json::to_string_pretty(results).unwrap_or_default());
}

pub fn print_checkpoints(checkpoints: &[Checkpoint]) {
    if checkpoints.is_empty() {
        println!("No checkpoints.");
        return;
    }
    let dim = Style::new().dim();
    for cp in checkpoints {
        let state = if cp.can_resume() {
            Style::new().yellow().apply_to(cp.snapshot.resume_state().to_string())
        } else {
            dim.apply_to(cp.snapshot.state.to_string())
        };
        println!(
            "  {:<12} {:<10} {:<18} {:>5.1}%  {}  {}",
            cp.tenant,
            cp.platform,
            state,
            cp.progress_percentage(),
            cp.event.title,
            dim.apply_to(cp.updated_at.format("%Y-%m-%d %H:%M"))
        );
    }
}
