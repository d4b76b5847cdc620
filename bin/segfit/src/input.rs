use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};

use common::{Bar, Error, Point, Result};

/// Read the whole input from `path`, or from stdin when no path is given.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Non-empty, non-comment lines with their 1-based line numbers.
fn data_lines(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(n, line)| (n, line.split_whitespace().collect()))
}

fn number(line: usize, field: &str, name: &str) -> Result<f64> {
    field.parse::<f64>().map_err(|e| Error::Parse {
        line,
        message: format!("{name} '{field}': {e}"),
    })
}

/// Parse `x y` pairs, one per line.
pub fn parse_points(text: &str) -> Result<Vec<Point>> {
    data_lines(text)
        .map(|(line, fields)| match fields.as_slice() {
            [x, y] => Ok(Point::new(number(line, x, "x")?, number(line, y, "y")?)),
            _ => Err(Error::Parse {
                line,
                message: format!("expected 'x y', got {} fields", fields.len()),
            }),
        })
        .collect()
}

/// Parse `symbol high low [close]` bars, one per line. Bars are stamped one day
/// apart in input order starting at the Unix epoch.
pub fn parse_bars(text: &str) -> Result<Vec<Bar>> {
    data_lines(text)
        .enumerate()
        .map(|(seq, (line, fields))| {
            let (symbol, high, low, close) = match fields.as_slice() {
                [symbol, high, low] => (*symbol, *high, *low, None),
                [symbol, high, low, close] => (*symbol, *high, *low, Some(*close)),
                _ => {
                    return Err(Error::Parse {
                        line,
                        message: format!(
                            "expected 'symbol high low [close]', got {} fields",
                            fields.len()
                        ),
                    })
                }
            };
            let high = number(line, high, "high")?;
            let low = number(line, low, "low")?;
            let close = match close {
                Some(close) => number(line, close, "close")?,
                None => (high + low) / 2.0,
            };
            let timestamp = DateTime::<Utc>::from_timestamp(seq as i64 * 86_400, 0).ok_or_else(
                || Error::Parse {
                    line,
                    message: "too many bars to timestamp".into(),
                },
            )?;
            Ok(Bar {
                symbol: symbol.to_string(),
                high,
                low,
                close,
                timestamp,
            })
        })
        .collect()
}
