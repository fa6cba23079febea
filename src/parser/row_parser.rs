use crate::parser::{ParseError, ParseErrorReason};
use crate::types::LineNumber;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::sync::Arc;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// One statement line split into named string fields.
///
/// Values are kept as text; numeric coercion belongs to the field mapper. Column order
/// follows the header the row was parsed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    line_number: LineNumber,
    columns: Arc<[String]>,
    values: Vec<String>
}

impl RawRow {
    pub fn line_number(&self) -> LineNumber {
        self.line_number
    }

    /// Returns the value under `column`, or `None` when the header has no such column.
    ///
    /// An exact match wins; otherwise the first column equal ignoring case and surrounding
    /// whitespace is used, since processors are inconsistent about header capitalization.
    pub fn get(&self, column: &str) -> Option<&str> {
        let index = self.columns.iter().position(|name| name == column)
            .or_else(|| {
                let wanted = column.trim();
                self.columns.iter().position(|name| name.trim().eq_ignore_ascii_case(wanted))
            })?;

        self.values.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Splits a header line into trimmed column names.
pub fn parse_header(raw_line: &str, line_number: LineNumber) -> Result<Vec<String>, ParseError> {
    let raw_line = raw_line.trim_start_matches(BYTE_ORDER_MARK);
    let columns = split_fields(raw_line, line_number)?;

    if columns.iter().all(|column| column.is_empty()) {
        return Err(ParseError::new(line_number, ParseErrorReason::EmptyHeader));
    }

    Ok(columns)
}

/// Splits a data line and pairs each value with its header column.
///
/// # Errors
/// Returns a `ParseError` when quoting is unbalanced or the number of values differs from
/// the number of header columns. Empty values are not errors.
pub fn parse_row(raw_line: &str, columns: &Arc<[String]>, line_number: LineNumber) -> Result<RawRow, ParseError> {
    let values = split_fields(raw_line, line_number)?;

    if values.len() != columns.len() {
        return Err(ParseError::new(line_number, ParseErrorReason::ColumnCount {
            expected: columns.len(),
            found: values.len()
        }));
    }

    Ok(RawRow {
        line_number,
        columns: columns.clone(),
        values
    })
}

fn split_fields(raw_line: &str, line_number: LineNumber) -> Result<Vec<String>, ParseError> {
    let raw_line = raw_line.trim_end_matches(['\r', '\n']);

    //NOTE: The csv reader quietly swallows an unterminated quote to the end of input, so
    //      it has to be caught up front.
    if has_unterminated_quote(raw_line) {
        return Err(ParseError::new(line_number, ParseErrorReason::UnbalancedQuotes));
    }

    let tightened = tighten_quoted_fields(raw_line);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(tightened.as_bytes());

    let mut record = StringRecord::new();

    let has_record = reader.read_record(&mut record)
        .map_err(|error| ParseError::new(line_number, ParseErrorReason::Malformed(error.to_string())))?;

    if !has_record {
        return Ok(vec![String::new()]);
    }

    Ok(record.iter().map(str::to_string).collect())
}

/// True when a field opens a quote that never closes.
///
/// A quote only opens a field when it is the first non-blank character after a delimiter;
/// anywhere else (`12" Subs`) it is literal text, as the csv reader treats it.
fn has_unterminated_quote(raw_line: &str) -> bool {
    let mut characters = raw_line.chars().peekable();
    let mut at_field_start = true;
    let mut in_quotes = false;

    while let Some(character) = characters.next() {
        if in_quotes {
            if character == '"' {
                if characters.peek() == Some(&'"') {
                    characters.next();
                } else {
                    in_quotes = false;
                }
            }
        } else if character == ',' {
            at_field_start = true;
        } else if character == '"' && at_field_start {
            in_quotes = true;
            at_field_start = false;
        } else if !character.is_whitespace() {
            at_field_start = false;
        }
    }

    in_quotes
}

/// Drops whitespace between a delimiter and a quoted field, which the csv reader would
/// otherwise treat as part of an unquoted value.
fn tighten_quoted_fields(raw_line: &str) -> String {
    let characters: Vec<char> = raw_line.chars().collect();
    let mut output = String::with_capacity(raw_line.len());
    let mut in_quotes = false;
    let mut index = 0;

    while index < characters.len() {
        let character = characters[index];

        if in_quotes {
            if character == '"' {
                if characters.get(index + 1) == Some(&'"') {
                    output.push_str("\"\"");
                    index += 2;
                    continue;
                }

                in_quotes = false;
            }
        } else if character == '"' {
            in_quotes = matches!(output.chars().last(), None | Some(','));
        } else if character.is_whitespace() {
            let run_end = (index..characters.len())
                .find(|&position| !characters[position].is_whitespace())
                .unwrap_or(characters.len());

            let previous = output.chars().last();
            let next = characters.get(run_end).copied();
            let opens_quote = matches!(previous, None | Some(',')) && next == Some('"');
            let closes_quote = previous == Some('"') && matches!(next, None | Some(','));

            if opens_quote || closes_quote {
                index = run_end;
                continue;
            }
        }

        output.push(character);
        index += 1;
    }

    output
}
