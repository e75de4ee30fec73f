use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use structura::engine::progress::{Progress, ProgressCallback};
use tracing::warn;

const SPINNER_TICK_MS: u64 = 100;

/// Renders workflow [`Progress`] events as a single stderr bar.
#[derive(Clone)]
pub struct PhaseProgress {
    pb: Arc<Mutex<ProgressBar>>,
}

impl PhaseProgress {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// A handler that tracks state but draws nothing, used with `--quiet`.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::new(0).with_style(Self::spinner_style());
        pb.set_draw_target(target);
        pb.finish_and_clear();
        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn callback(&self) -> ProgressCallback<'static> {
        let pb = self.pb.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut bar) = pb.lock() else {
                warn!("Progress bar mutex was poisoned; dropping progress event.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => {
                    bar.reset();
                    bar.set_length(0);
                    bar.set_style(Self::spinner_style());
                    bar.set_prefix(name);
                    bar.set_message("");
                    bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                }
                Progress::PhaseFinish => {
                    bar.disable_steady_tick();
                    bar.finish_with_message("done");
                }
                Progress::TaskStart { total_steps } => {
                    bar.disable_steady_tick();
                    bar.reset();
                    bar.set_length(total_steps);
                    bar.set_position(0);
                    bar.set_style(Self::bar_style());
                }
                Progress::TaskIncrement => bar.inc(1),
                Progress::TaskFinish => {
                    let len = bar.length().unwrap_or(0);
                    if bar.position() < len {
                        bar.set_position(len);
                    }
                    bar.finish();
                }
                Progress::Message(msg) => {
                    if bar.is_finished() {
                        bar.set_message(msg);
                    } else {
                        bar.println(format!("  {msg}"));
                    }
                }
            }
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {prefix:.bold} {msg}")
            .expect("spinner template is valid")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{prefix:<18} [{bar:40.cyan/blue}] {pos}/{len} units ({eta})")
            .expect("bar template is valid")
            .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
            })
            .progress_chars("=>-")
    }
}

impl Default for PhaseProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_finished_and_empty() {
        let progress = PhaseProgress::hidden();
        let pb = progress.pb.lock().unwrap();
        assert_eq!(pb.length(), Some(0));
        assert!(pb.is_finished());
    }

    #[test]
    fn phase_and_task_events_drive_the_bar() {
        let progress = PhaseProgress::hidden();
        let callback = progress.callback();

        callback(Progress::PhaseStart { name: "Intra-Unit Bonds" });
        {
            let pb = progress.pb.lock().unwrap();
            assert_eq!(pb.prefix(), "Intra-Unit Bonds");
            assert!(!pb.is_finished());
        }

        callback(Progress::TaskStart { total_steps: 3 });
        callback(Progress::TaskIncrement);
        assert_eq!(progress.pb.lock().unwrap().position(), 1);

        callback(Progress::TaskFinish);
        {
            let pb = progress.pb.lock().unwrap();
            assert!(pb.is_finished());
            assert_eq!(pb.position(), 3);
        }

        callback(Progress::PhaseFinish);
        assert_eq!(progress.pb.lock().unwrap().message(), "done");
    }

    #[test]
    fn messages_after_finish_replace_the_message() {
        let progress = PhaseProgress::hidden();
        let callback = progress.callback();
        callback(Progress::Message("Assembly '1' has 2 units".into()));
        assert_eq!(progress.pb.lock().unwrap().message(), "Assembly '1' has 2 units");
    }

    #[test]
    fn callback_can_move_across_threads() {
        let progress = PhaseProgress::hidden();
        let callback = progress.callback();
        std::thread::spawn(move || {
            callback(Progress::PhaseStart { name: "Export" });
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();
        assert!(progress.pb.lock().unwrap().is_finished());
    }
}
