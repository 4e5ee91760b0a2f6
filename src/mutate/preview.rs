use super::plan::{AppliedInsertion, SkippedInsertion};
use std::fmt;
use std::path::PathBuf;

/// Lines of unchanged text shown around each inserted block.
const CONTEXT_LINES: usize = 2;

/// What `apply` would do to a file, computed without touching it.
#[derive(Debug, Clone)]
pub struct Preview {
    pub file: PathBuf,
    pub original: String,
    pub result: String,
    pub applied: Vec<AppliedInsertion>,
    pub skipped: Vec<SkippedInsertion>,
}

impl Preview {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} insertion(s), {} skipped",
            self.file.display(),
            self.applied.len(),
            self.skipped.len()
        )?;

        let lines: Vec<&str> = self.result.split('\n').collect();
        for insertion in &self.applied {
            writeln!(
                f,
                "@@ {} ({}) before line {}",
                insertion.element.name, insertion.element.kind, insertion.insertion_line
            )?;

            let first = insertion.start_line - 1;
            let last = (first + insertion.line_count).min(lines.len());
            let from = first.saturating_sub(CONTEXT_LINES);
            let to = (last + CONTEXT_LINES).min(lines.len());
            for (i, line) in lines.iter().enumerate().take(to).skip(from) {
                let marker = if (first..last).contains(&i) { ">>>" } else { "   " };
                writeln!(f, "{:>6} {marker} {}", i + 1, line.trim_end_matches('\r'))?;
            }
        }

        for skip in &self.skipped {
            writeln!(
                f,
                "skipped {} ({}) at line {}: {}",
                skip.element.name, skip.element.kind, skip.insertion_line, skip.reason
            )?;
        }
        Ok(())
    }
}
