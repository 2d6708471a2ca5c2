use crate::config::CellRef;

/// The content of one spreadsheet cell, after decoding.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// True for empty cells and for text cells that only contain whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// The content of the cell as trimmed text, if any.
    ///
    /// Numbers are rendered with their shortest representation, so that a group
    /// typed as `3` is read as "3" and not "3.0".
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) if s.trim().is_empty() => None,
            Cell::Text(s) => Some(s.trim().to_string()),
            Cell::Number(x) => Some(x.to_string()),
        }
    }
}

/// The decoded content of one worksheet.
///
/// Positions are absolute: row 0 and column 0 correspond to cell A1, regardless of
/// where the data starts in the worksheet. Cells outside of the stored area are empty.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Grid {
        Grid { rows }
    }

    pub fn get(&self, pos: CellRef) -> &Cell {
        self.rows
            .get(pos.row)
            .and_then(|row| row.get(pos.col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Sets a cell, growing the grid as needed.
    pub fn set(&mut self, pos: CellRef, cell: Cell) {
        if self.rows.len() <= pos.row {
            self.rows.resize(pos.row + 1, Vec::new());
        }
        let row = &mut self.rows[pos.row];
        if row.len() <= pos.col {
            row.resize(pos.col + 1, Cell::Empty);
        }
        row[pos.col] = cell;
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// True if no cell holds any content.
    pub fn is_blank(&self) -> bool {
        self.rows.iter().flatten().all(|c| c.is_blank())
    }
}
