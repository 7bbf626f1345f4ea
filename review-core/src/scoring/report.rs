//! CSV rendering of ablation reports.
//!
//! Layout: header `Paper,<config...>`, one row per paper (`N/A` where a config
//! produced no verdict), a blank row, then `Accept Count` and `Accept %`.

use std::fmt::Write as _;
use std::path::Path;

use super::ablation::AblationReport;
use super::ScoringResult;

/// Quote a CSV field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row<I, S>(out: &mut String, cells: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let row: Vec<String> = cells.into_iter().map(|c| csv_field(c.as_ref())).collect();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{}", row.join(","));
}

impl AblationReport {
    pub fn to_csv(&self) -> String {
        let mut out = String::new();

        csv_row(
            &mut out,
            std::iter::once("Paper".to_string()).chain(self.runs.iter().map(|r| r.name.clone())),
        );

        for paper in self.papers() {
            let cells = self.runs.iter().map(|run| {
                run.papers
                    .get(&paper)
                    .map(|score| score.verdict.to_string())
                    .unwrap_or_else(|| "N/A".to_string())
            });
            csv_row(&mut out, std::iter::once(paper.clone()).chain(cells));
        }

        out.push('\n');
        csv_row(
            &mut out,
            std::iter::once("Accept Count".to_string())
                .chain(self.runs.iter().map(|r| r.accept_count().to_string())),
        );
        csv_row(
            &mut out,
            std::iter::once("Accept %".to_string()).chain(
                self.runs
                    .iter()
                    .map(|r| format!("{:.1}%", self.accept_percentage(r))),
            ),
        );
        out
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> ScoringResult<()> {
        std::fs::write(path.as_ref(), self.to_csv())?;
        Ok(())
    }
}
