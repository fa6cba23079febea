mod errors;
mod row_parser;

pub use errors::{ParseError, ParseErrorReason};
pub use row_parser::{parse_header, parse_row, RawRow};
