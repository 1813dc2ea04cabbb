use std::fmt::Write as _;

use tracing::{info, warn};

/// Counts for one stage of one normalizer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCount {
    pub stage: &'static str,
    pub input: usize,
    pub output: usize,
    pub altered: usize,
}

impl StageCount {
    pub fn removed(&self) -> usize {
        self.input.saturating_sub(self.output)
    }

    /// The stage had records to work on and kept none of them.
    pub fn emptied(&self) -> bool {
        self.input > 0 && self.output == 0
    }
}

pub struct StageTracker {
    run_id: String,
    stages: Vec<StageCount>,
}

impl StageTracker {
    pub fn new(run_id: String) -> Self {
        StageTracker {
            run_id,
            stages: Vec::new(),
        }
    }

    pub fn record(&mut self, stage: &'static str, input: usize, output: usize, altered: usize) {
        let count = StageCount {
            stage,
            input,
            output,
            altered,
        };
        info!(
            run_id = %self.run_id,
            stage,
            input,
            output,
            removed = count.removed(),
            altered,
            "stage done"
        );
        if count.emptied() {
            warn!(run_id = %self.run_id, stage, input, "stage removed every record");
        }
        self.stages.push(count);
    }

    pub fn stages(&self) -> &[StageCount] {
        &self.stages
    }

    pub fn get(&self, stage: &str) -> Option<&StageCount> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn total_removed(&self) -> usize {
        self.stages.iter().map(StageCount::removed).sum()
    }

    /// Fixed-width table, one row per stage, with a running removal total.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Normalizer run {}", self.run_id);
        let _ = writeln!(
            out,
            "{:<28} | {:>7} | {:>7} | {:>7} | {:>7} | {:>9}",
            "stage", "in", "out", "removed", "altered", "cum. rem."
        );
        let _ = writeln!(out, "{}", "-".repeat(28 + 7 * 4 + 9 + 15));
        let mut cumulative = 0;
        for s in &self.stages {
            cumulative += s.removed();
            let _ = writeln!(
                out,
                "{:<28} | {:>7} | {:>7} | {:>7} | {:>7} | {:>9}",
                s.stage,
                s.input,
                s.output,
                s.removed(),
                s.altered,
                cumulative
            );
        }
        out
    }
}

pub fn new_run_id() -> String {
    chrono::Local::now().format("run-%Y%m%d-%H%M%S").to_string()
}
