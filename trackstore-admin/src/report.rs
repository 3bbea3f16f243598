//! Operator facing rendering of merge plans and merge summaries.

use std::fmt::Write as _;

use trackstore_merge::classifier::MergePlan;
use trackstore_merge::report::MergeSummary;
use trackstore_merge::types::TableKind;

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Right,
}

/// A plain text table with a header row and bordered cells.
#[derive(Debug)]
struct Grid {
    columns: Vec<(&'static str, Align)>,
    rows: Vec<Vec<String>>,
}

impl Grid {
    fn new(columns: &[(&'static str, Align)]) -> Self {
        Self {
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, (header, _))| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or_default()
            })
            .collect()
    }

    fn render(&self) -> String {
        let widths = self.widths();
        let border = widths
            .iter()
            .map(|width| "-".repeat(width + 2))
            .collect::<Vec<_>>()
            .join("+");

        let mut out = String::new();
        let _ = writeln!(out, "+{border}+");
        let headers = self
            .columns
            .iter()
            .zip(&widths)
            .map(|((header, _), width)| format!(" {header:<width$} "))
            .collect::<Vec<_>>();
        let _ = writeln!(out, "|{}|", headers.join("|"));
        let _ = writeln!(out, "+{border}+");

        for row in &self.rows {
            let cells = self
                .columns
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(idx, ((_, align), width))| {
                    let cell = row.get(idx).map(String::as_str).unwrap_or_default();
                    match align {
                        Align::Left => format!(" {cell:<width$} "),
                        Align::Right => format!(" {cell:>width$} "),
                    }
                })
                .collect::<Vec<_>>();
            let _ = writeln!(out, "|{}|", cells.join("|"));
        }
        if !self.rows.is_empty() {
            let _ = writeln!(out, "+{border}+");
        }

        out
    }
}

/// Renders the statistics of a merge run.
///
/// Row by row merged tables are listed per tier with their already present, added and modified
/// counts. Tables copied per added datafile only have an added count. The names of the added rows
/// close the report.
pub fn render_summary(summary: &MergeSummary) -> String {
    let mut sections = Vec::new();

    for (kind, title) in [
        (TableKind::Reference, "Reference tables"),
        (TableKind::Metadata, "Metadata tables"),
    ] {
        let statistics = summary.statistics(kind);
        if statistics.is_empty() {
            continue;
        }

        let mut grid = Grid::new(&[
            ("Table", Align::Left),
            ("Already present", Align::Right),
            ("Added", Align::Right),
            ("Modified", Align::Right),
        ]);
        for (table, stats) in statistics {
            grid.push_row(vec![
                table.to_string(),
                stats.already_there.to_string(),
                stats.added.to_string(),
                stats.modified.to_string(),
            ]);
        }
        sections.push(format!("{title}\n{}", grid.render()));
    }

    let copy_counts = summary.copy_counts();
    if !copy_counts.is_empty() {
        let mut grid = Grid::new(&[("Table", Align::Left), ("Added", Align::Right)]);
        for (table, added) in copy_counts {
            grid.push_row(vec![table.to_string(), added.to_string()]);
        }
        sections.push(format!("Measurement tables\n{}", grid.render()));
    }

    let mut entries = String::from("Entries added\n");
    let added_names = summary.added_names();
    if added_names.is_empty() {
        entries.push_str("  none\n");
    }
    for (table, names) in added_names {
        let _ = writeln!(entries, "  {table}: {}", names.join(", "));
    }
    sections.push(entries);

    sections.join("\n")
}

/// Renders the order in which a merge run processes the tables.
pub fn render_plan(plan: &MergePlan) -> String {
    let mut grid = Grid::new(&[
        ("Step", Align::Right),
        ("Stage", Align::Left),
        ("Table", Align::Left),
    ]);
    for (idx, (stage, table)) in plan.steps().into_iter().enumerate() {
        grid.push_row(vec![
            (idx + 1).to_string(),
            stage.to_string(),
            table.to_string(),
        ]);
    }

    let mut out = grid.render();
    if !plan.excluded.is_empty() {
        let _ = writeln!(out, "Never merged: {}", plan.excluded.join(", "));
    }

    out
}
