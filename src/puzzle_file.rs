//! Loader for line-oriented puzzle files.
//!
//! Each record is `kind,length,row,col`:
//! - `sh`: the target, always horizontal
//! - `h` / `v`: a movable horizontal / vertical vehicle
//! - `b`: an immovable block covering the single cell at `row,col`
//!
//! Ids are assigned by order of appearance: `sh`, then `h1, h2, ..`,
//! `v1, v2, ..` and `b1, b2, ..`. Blank lines and lines starting with `#`
//! are skipped.

use std::fs;
use std::path::Path;

use log::debug;
use thiserror::Error;

use crate::grid::{Board, BoardError};
use crate::vehicles::VehicleSpec;

/// Grid size assumed when the caller does not pick one.
pub const DEFAULT_SIZE: i32 = 6;

/// Puzzle used when no file is given.
pub const SAMPLE: &str = include_str!("../puzzles/beginner.csv");

#[derive(Debug, Error)]
pub enum PuzzleFileError {
    #[error("cannot read puzzle file: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error(transparent)]
    Board(#[from] BoardError),
}

fn parse_error(line: usize, reason: impl Into<String>) -> PuzzleFileError {
    PuzzleFileError::Parse {
        line,
        reason: reason.into(),
    }
}

#[derive(Default)]
struct IdCounter {
    h: usize,
    v: usize,
    b: usize,
}

/// Parses one record into a vehicle spec, assigning its id.
fn parse_record(
    record: &str,
    line: usize,
    ids: &mut IdCounter,
) -> Result<VehicleSpec, PuzzleFileError> {
    let fields: Vec<&str> = record.split(',').map(str::trim).collect();
    let [kind, length, row, col] = fields[..] else {
        return Err(parse_error(
            line,
            format!("expected 4 comma-separated fields, found {}", fields.len()),
        ));
    };

    let number = |name: &str, field: &str| {
        field
            .parse::<i32>()
            .map_err(|_| parse_error(line, format!("{name} {field:?} is not an integer")))
    };
    let length = number("length", length)?;
    let row = number("row", row)?;
    let col = number("col", col)?;

    let spec = match kind {
        "sh" => VehicleSpec::horizontal("sh", length, row, col).target(),
        "h" => {
            ids.h += 1;
            VehicleSpec::horizontal(format!("h{}", ids.h), length, row, col)
        }
        "v" => {
            ids.v += 1;
            VehicleSpec::vertical(format!("v{}", ids.v), length, row, col)
        }
        "b" => {
            ids.b += 1;
            VehicleSpec::block(format!("b{}", ids.b), row, col)
        }
        other => {
            return Err(parse_error(
                line,
                format!("unknown kind {other:?}, expected sh, h, v or b"),
            ))
        }
    };
    Ok(spec)
}

/// Parses puzzle text into a board of the given size.
pub fn parse(text: &str, size: i32) -> Result<Board, PuzzleFileError> {
    let mut ids = IdCounter::default();
    let mut specs = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let record = raw.trim();
        if record.is_empty() || record.starts_with('#') {
            continue;
        }
        specs.push(parse_record(record, index + 1, &mut ids)?);
    }

    debug!("parsed {} vehicles", specs.len());
    Ok(Board::new(size, specs)?)
}

/// Reads and parses a puzzle file.
pub fn load(path: impl AsRef<Path>, size: i32) -> Result<Board, PuzzleFileError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    debug!("loading puzzle from {}", path.display());
    parse(&text, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicles::Axis;

    #[test]
    fn test_sample_parses() {
        let board = parse(SAMPLE, DEFAULT_SIZE).unwrap();
        let layout = board.layout();
        let ids: Vec<&str> = layout.vehicles().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["sh", "v1", "h1", "v2", "v3", "v4", "h2"]);
        assert_eq!(layout.target(), 0);
        assert_eq!(board.target_head(), (2, 1));
        assert!(!board.is_goal());
    }

    #[test]
    fn test_sample_matches_bundled_file() {
        let bundled = load(Path::new("puzzles/beginner.csv"), DEFAULT_SIZE).unwrap();
        assert_eq!(parse(SAMPLE, DEFAULT_SIZE).unwrap(), bundled);
    }

    #[test]
    fn test_block_records_cover_one_cell() {
        let board = parse("sh,2,2,0\nb,3,0,0\nv,2,3,5\nb,1,4,4\n", 6).unwrap();
        let layout = board.layout();
        let block = layout.vehicle(layout.find("b2").unwrap());
        assert_eq!(block.length, 1);
        assert!(!block.movable);
        assert_eq!(board.head(layout.find("b1").unwrap()), (0, 0));
        assert_eq!(layout.vehicle(layout.find("v1").unwrap()).axis, Axis::Vertical);
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let text = "# header\n\n  sh , 2 , 2 , 0  \n\n# trailing\n";
        let board = parse(text, 6).unwrap();
        assert_eq!(board.heads(), &[(2, 0)]);
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let err = parse("sh,2,2,0\n\nh,2,x,0\n", 6).unwrap_err();
        assert!(matches!(err, PuzzleFileError::Parse { line: 3, .. }), "{err}");

        let err = parse("sh,2,2\n", 6).unwrap_err();
        assert!(matches!(err, PuzzleFileError::Parse { line: 1, .. }), "{err}");

        let err = parse("sh,2,2,0\nd,2,0,0\n", 6).unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 2: unknown kind \"d\", expected sh, h, v or b"
        );
    }

    #[test]
    fn test_board_errors_pass_through() {
        let err = parse("h,2,0,0\n", 6).unwrap_err();
        assert!(matches!(err, PuzzleFileError::Board(BoardError::MissingTarget)));

        let err = parse("sh,2,2,0\nv,2,1,1\n", 6).unwrap_err();
        assert!(matches!(err, PuzzleFileError::Board(BoardError::Overlap { .. })));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load("no/such/puzzle.csv", 6).unwrap_err();
        assert!(matches!(err, PuzzleFileError::Io(_)));
    }
}
