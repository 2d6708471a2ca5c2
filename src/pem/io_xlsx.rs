// Decoding of the evaluation forms.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::pem::*;

/// Reads one worksheet of a form: the named one, or the first one.
pub fn read_form(path: &Path, worksheet: Option<&str>) -> PemResult<Grid> {
    let path_s = path.display().to_string();
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu {
        path: path_s.clone(),
    })?;
    let wrange = match worksheet {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu {
                path: path_s.clone(),
                name,
            })?
            .context(OpeningExcelSnafu {
                path: path_s.clone(),
            })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu {
                path: path_s.clone(),
            })?
            .context(OpeningExcelSnafu {
                path: path_s.clone(),
            })?,
    };
    debug!(
        "read_form: {:?}: range starting at {:?}, size {:?}",
        path_s,
        wrange.start(),
        wrange.get_size()
    );
    Ok(range_to_grid(&wrange))
}

/// Places the content of the range at its absolute position in the sheet.
pub fn range_to_grid(wrange: &Range<DataType>) -> Grid {
    let mut grid = Grid::default();
    let (row0, col0) = match wrange.start() {
        Some((r, c)) => (r as usize, c as usize),
        None => return grid,
    };
    for (ridx, row) in wrange.rows().enumerate() {
        for (cidx, elt) in row.iter().enumerate() {
            let cell = read_cell(elt);
            if cell != Cell::Empty {
                grid.set(CellRef::new(row0 + ridx, col0 + cidx), cell);
            }
        }
    }
    grid
}

fn read_cell(elt: &DataType) -> Cell {
    match elt {
        DataType::Empty => Cell::Empty,
        DataType::String(s) => Cell::Text(s.clone()),
        DataType::Int(i) => Cell::Number(*i as f64),
        DataType::Float(f) => Cell::Number(*f),
        // Dates are not expected on the form, keep the serial value.
        DataType::DateTime(f) => Cell::Number(*f),
        DataType::Bool(b) => Cell::Text(b.to_string()),
        DataType::Error(e) => Cell::Text(format!("{:?}", e)),
    }
}
