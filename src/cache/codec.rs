//! Tab-separated row codec for cache files
//!
//! Rows use a tab delimiter and `\r\n` terminator. Fields containing a tab,
//! a double quote, or a line break are wrapped in double quotes with
//! embedded quotes doubled. Both `\n` and `\r\n` are accepted when reading.

const DELIMITER: char = '\t';
const QUOTE: char = '"';
const TERMINATOR: &str = "\r\n";

/// Encodes one row, including its line terminator
pub fn encode_row<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let mut line = String::new();

    for (i, value) in values.into_iter().enumerate() {
        if i > 0 {
            line.push(DELIMITER);
        }
        if needs_quoting(value) {
            line.push(QUOTE);
            line.push_str(&value.replace(QUOTE, "\"\""));
            line.push(QUOTE);
        } else {
            line.push_str(value);
        }
    }

    line.push_str(TERMINATOR);
    line
}

fn needs_quoting(value: &str) -> bool {
    value
        .chars()
        .any(|c| c == DELIMITER || c == QUOTE || c == '\r' || c == '\n')
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ParseState {
    StartField,
    InField,
    InQuoted,
    QuoteInQuoted,
}

/// Splits file content into rows of fields
///
/// Blank lines are skipped. A quote only opens a quoted field at the start
/// of a field; anywhere else it is kept literally.
pub fn parse_rows(content: &str) -> Vec<Vec<String>> {
    scan_rows(content).0
}

/// Splits file content into rows and reports how the content ends
///
/// # Returns
///
/// The parsed rows, and the text that must be written before another row
/// when the last row was cut off: `None` when the content ends on a row
/// boundary, `"\r\n"` for a torn unquoted field, or `"\"\r\n"` when the
/// content ends inside a quoted field.
pub fn scan_rows(content: &str) -> (Vec<Vec<String>>, Option<&'static str>) {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut state = ParseState::StartField;
    let mut row_started = false;

    for c in content.chars() {
        match (state, c) {
            (ParseState::InQuoted, QUOTE) => state = ParseState::QuoteInQuoted,
            (ParseState::InQuoted, _) => field.push(c),
            (ParseState::QuoteInQuoted, QUOTE) => {
                field.push(QUOTE);
                state = ParseState::InQuoted;
            }
            (_, DELIMITER) => {
                row.push(std::mem::take(&mut field));
                state = ParseState::StartField;
                row_started = true;
            }
            (_, '\r' | '\n') => {
                if row_started {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                state = ParseState::StartField;
                row_started = false;
            }
            (ParseState::StartField, QUOTE) => {
                state = ParseState::InQuoted;
                row_started = true;
            }
            _ => {
                field.push(c);
                state = ParseState::InField;
                row_started = true;
            }
        }
    }

    let tail = match state {
        ParseState::InQuoted => Some("\"\r\n"),
        _ if row_started => Some(TERMINATOR),
        _ => None,
    };

    // Final row without a terminator
    if row_started {
        row.push(field);
        rows.push(row);
    }

    (rows, tail)
}
