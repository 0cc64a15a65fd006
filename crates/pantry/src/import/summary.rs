use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Aggregate counters for one batch run. Not persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub total_files: u64,
    pub processed_files: u64,
    pub failed_files: u64,
    /// Records in the store after the run, not records imported by it.
    pub total_products: u64,
}

impl BatchResult {
    pub fn has_failures(&self) -> bool {
        self.failed_files > 0
    }
}

/// A batch result plus its wall-clock duration, as shown to operators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatchReport {
    #[serde(flatten)]
    pub result: BatchResult,
    pub execution_time_secs: f64,
}

impl BatchReport {
    pub fn new(result: BatchResult, elapsed: Duration) -> Self {
        Self {
            result,
            execution_time_secs: (elapsed.as_secs_f64() * 100.0).round() / 100.0,
        }
    }

    fn rows(&self) -> [(&'static str, String); 5] {
        [
            ("Total Files", self.result.total_files.to_string()),
            ("Processed Files", self.result.processed_files.to_string()),
            ("Failed Files", self.result.failed_files.to_string()),
            (
                "Total Products in Database",
                self.result.total_products.to_string(),
            ),
            ("Execution Time", format!("{:.2}s", self.execution_time_secs)),
        ]
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.rows();
        let key_width = rows
            .iter()
            .map(|(k, _)| k.len())
            .max()
            .unwrap_or(0)
            .max("Metric".len());
        let value_width = rows
            .iter()
            .map(|(_, v)| v.len())
            .max()
            .unwrap_or(0)
            .max("Value".len());

        let border = format!(
            "+{}+{}+",
            "-".repeat(key_width + 2),
            "-".repeat(value_width + 2)
        );
        writeln!(f, "{}", border)?;
        writeln!(
            f,
            "| {:<kw$} | {:<vw$} |",
            "Metric",
            "Value",
            kw = key_width,
            vw = value_width
        )?;
        writeln!(f, "{}", border)?;
        for (key, value) in &rows {
            writeln!(
                f,
                "| {:<kw$} | {:<vw$} |",
                key,
                value,
                kw = key_width,
                vw = value_width
            )?;
        }
        write!(f, "{}", border)
    }
}
