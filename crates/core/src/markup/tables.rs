//! Fixed-width rendering of `<table>` structures.
//!
//! Tables become monospaced text blocks wrapped in a code fence so chat
//! clients render the columns aligned. Header cells (`<th>`) are uppercased.

use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

/// Column content wider than this is cut.
const MAX_COLUMN_WIDTH: usize = 60;

static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th, td").unwrap());

struct Cell {
    text: String,
    header: bool,
}

/// Renders a `<table>` element as a fenced fixed-width block, or an empty
/// string for a table without any cell content.
pub(crate) fn render_table(table: ElementRef) -> String {
    let rows: Vec<Vec<Cell>> = table
        .select(&ROW)
        .map(|row| row.select(&CELL).map(cell_content).collect())
        .filter(|cells: &Vec<Cell>| cells.iter().any(|c| !c.text.is_empty()))
        .collect();

    if rows.is_empty() {
        return String::new();
    }

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];

    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.text.chars().count());
        }
    }

    let mut out = String::from("```\n");
    let has_header = rows[0].iter().any(|c| c.header);

    for (index, row) in rows.iter().enumerate() {
        out.push_str(&render_row(row, &widths));
        out.push('\n');

        if index == 0 && has_header {
            out.push_str(&divider(&widths));
            out.push('\n');
        }
    }

    out.push_str("```");
    out
}

fn cell_content(cell: ElementRef) -> Cell {
    let header = cell.value().name() == "th";
    let collapsed = cell.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ");

    let mut text = if header { collapsed.to_uppercase() } else { collapsed };

    if text.chars().count() > MAX_COLUMN_WIDTH {
        text = text.chars().take(MAX_COLUMN_WIDTH).collect();
    }

    Cell { text, header }
}

fn render_row(row: &[Cell], widths: &[usize]) -> String {
    let mut line = String::new();

    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            line.push_str(" | ");
        }

        let text = row.get(i).map(|c| c.text.as_str()).unwrap_or("");
        line.push_str(text);

        let pad = width.saturating_sub(text.chars().count());
        line.extend(std::iter::repeat_n(' ', pad));
    }

    line.trim_end().to_string()
}

fn divider(widths: &[usize]) -> String {
    widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-|-")
}
