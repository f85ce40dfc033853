use super::state::{FlowStatus, TestSummary};
use tokio::sync::broadcast;

/// Run events for real-time progress output
#[derive(Debug, Clone)]
pub enum TestEvent {
    // Session events
    SessionStarted {
        session_id: String,
    },
    SessionFinished {
        summary: TestSummary,
    },

    // Flow events
    FlowStarted {
        flow_name: String,
        step_count: usize,
    },
    FlowFinished {
        flow_name: String,
        status: FlowStatus,
        duration_ms: Option<u64>,
    },

    // Step events
    StepStarted {
        flow_name: String,
        index: usize,
        description: String,
    },
    StepPassed {
        flow_name: String,
        index: usize,
        duration_ms: u64,
    },
    StepFailed {
        flow_name: String,
        index: usize,
        error: String,
        duration_ms: u64,
    },
    StepSkipped {
        flow_name: String,
        index: usize,
        reason: String,
    },

    // Provisioning and other progress lines
    Log {
        message: String,
    },
}

/// Event emitter for broadcasting run events
#[derive(Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<TestEvent>,
}

impl EventEmitter {
    pub fn new() -> (Self, broadcast::Receiver<TestEvent>) {
        let (sender, receiver) = broadcast::channel(100);
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: TestEvent) {
        let _ = self.sender.send(event);
    }

    pub fn log(&self, message: impl Into<String>) {
        self.emit(TestEvent::Log {
            message: message.into(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TestEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }
}

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration as StdDuration;

/// Console event listener printing live progress.
///
/// Runs until every [`EventEmitter`] feeding it has been dropped.
pub struct ConsoleEventListener;

impl ConsoleEventListener {
    pub async fn listen(mut receiver: broadcast::Receiver<TestEvent>) {
        use colored::Colorize;
        use std::io::IsTerminal;

        let interactive = std::io::stdout().is_terminal();
        let mut spinner: Option<ProgressBar> = None;
        let mut step_text = String::new();

        loop {
            let event = match receiver.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            };

            match event {
                TestEvent::SessionStarted { session_id } => {
                    println!(
                        "\n{} Test session started: {}",
                        "▶".green().bold(),
                        session_id.cyan()
                    );
                }

                TestEvent::SessionFinished { summary } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    println!("\n{} Test session finished", "■".blue().bold());
                    println!("  Total flows: {}", summary.total_flows);
                    println!("  Total steps: {}", summary.total_steps);
                    println!(
                        "  {} passed, {} failed, {} skipped",
                        summary.passed.to_string().green(),
                        summary.failed.to_string().red(),
                        summary.skipped.to_string().yellow()
                    );
                    if let Some(duration) = summary.total_duration_ms {
                        println!("  Duration: {}ms", duration);
                    }
                }

                TestEvent::FlowStarted {
                    flow_name,
                    step_count,
                } => {
                    println!(
                        "\n  {} Flow: {} ({} steps)",
                        "→".blue(),
                        flow_name.white().bold(),
                        step_count
                    );
                }

                TestEvent::FlowFinished {
                    flow_name,
                    status,
                    duration_ms,
                } => {
                    let status_str = match status {
                        FlowStatus::Passed => "PASSED".green().bold(),
                        FlowStatus::Failed => "FAILED".red().bold(),
                        _ => "UNKNOWN".white().bold(),
                    };
                    println!("  {} Flow {} [{}]", "←".blue(), flow_name, status_str);
                    if let Some(duration) = duration_ms {
                        println!("    Duration: {}ms", duration);
                    }
                }

                TestEvent::StepStarted {
                    index,
                    description,
                    ..
                } => {
                    step_text = format!("[{}] {} ", index, description);

                    if interactive {
                        let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stdout());
                        let style = ProgressStyle::default_spinner()
                            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                            .template("    {spinner} {msg}")
                            .unwrap();
                        pb.set_style(style);
                        pb.set_message(step_text.dimmed().to_string());
                        pb.enable_steady_tick(StdDuration::from_millis(100));
                        spinner = Some(pb);
                    } else {
                        println!("    [ ] {}", step_text);
                    }
                }

                TestEvent::StepPassed { duration_ms, .. } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    println!("    {} {}({}ms)", "✓".green(), step_text, duration_ms);
                }

                TestEvent::StepFailed {
                    error, duration_ms, ..
                } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    println!("    {} {}({}ms)", "✗".red(), step_text, duration_ms);
                    for line in error.lines() {
                        println!("        {}", line.red());
                    }
                }

                TestEvent::StepSkipped {
                    index,
                    reason,
                    ..
                } => {
                    println!("    {} [{}] {}", "○".yellow(), index, reason.dimmed());
                }

                TestEvent::Log { message } => {
                    if let Some(pb) = &spinner {
                        pb.println(format!("      {}", message));
                    } else {
                        println!("  {}", message);
                    }
                }
            }
        }
    }
}
