use crate::error::{ProcessingError, Result};
use crate::models::{Cell, LabeledTable, SourceMetadata};
use crate::readers::source::SheetSource;
use crate::utils::constants::{META_LITERAL_ROW, META_LOCATION_ROW, META_SHEET};
use serde_json::{Map, Number, Value};
use std::iter::Peekable;
use std::str::Chars;

/// Reads the location id and metadata mapping from a source's Meta sheet.
pub struct MetadataReader;

impl MetadataReader {
    pub fn new() -> Self {
        Self
    }

    pub fn extract<S: SheetSource + ?Sized>(&self, source: &S) -> Result<(u32, SourceMetadata)> {
        let sheet = source.read_sheet(META_SHEET)?;
        self.from_table(&LabeledTable::with_header(&sheet))
    }

    /// Location comes from the row labelled `0`, the metadata literal from row `1`.
    pub fn from_table(&self, table: &LabeledTable) -> Result<(u32, SourceMetadata)> {
        let location_cell = Self::meta_cell(table, META_LOCATION_ROW)?;
        let location = location_cell
            .as_integer()
            .and_then(|id| u32::try_from(id).ok())
            .ok_or_else(|| {
                ProcessingError::Parse(format!("Invalid location id: '{}'", location_cell))
            })?;

        let literal_cell = Self::meta_cell(table, META_LITERAL_ROW)?;
        let literal = literal_cell.as_label().ok_or_else(|| {
            ProcessingError::Parse(format!("Metadata cell is not text: '{}'", literal_cell))
        })?;

        Ok((location, parse_metadata_literal(literal)?))
    }

    fn meta_cell(table: &LabeledTable, label: i64) -> Result<&Cell> {
        table
            .row_by_label(label)
            .and_then(|row| row.values.first())
            .filter(|cell| !cell.is_empty())
            .ok_or_else(|| {
                ProcessingError::Parse(format!("Meta sheet has no value in row {}", label))
            })
    }
}

impl Default for MetadataReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a flat literal mapping such as `{'yr_start': 2021, 'yr_end': 2021}`.
///
/// Keys must be quoted strings. Values may be integers, floats, quoted
/// strings, `True`, `False` or `None`; nested containers are rejected.
pub fn parse_metadata_literal(text: &str) -> Result<SourceMetadata> {
    let mut map = LiteralParser::new(text).parse_mapping()?;
    if let Some(year) = map.get_mut("yr_start") {
        if let Some(integral) = integral_float(year) {
            *year = integral;
        }
    }
    serde_json::from_value(Value::Object(map))
        .map_err(|e| ProcessingError::Parse(format!("Metadata schema mismatch in '{}': {}", text, e)))
}

/// A float with no fractional part, such as `2021.0`, as an integer value.
fn integral_float(value: &Value) -> Option<Value> {
    if !value.is_f64() {
        return None;
    }
    let float = value.as_f64()?;
    let in_range = float >= f64::from(i32::MIN) && float <= f64::from(i32::MAX);
    (float.fract() == 0.0 && in_range).then(|| Value::from(float as i64))
}

struct LiteralParser<'a> {
    text: &'a str,
    chars: Peekable<Chars<'a>>,
}

impl<'a> LiteralParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.chars().peekable(),
        }
    }

    fn error(&self, message: &str) -> ProcessingError {
        ProcessingError::Parse(format!("{} in metadata literal '{}'", message, self.text))
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_whitespace();
        match self.chars.next() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(&format!("Expected '{}', found '{}'", expected, c))),
            None => Err(self.error(&format!("Expected '{}', found end of input", expected))),
        }
    }

    fn parse_mapping(&mut self) -> Result<Map<String, Value>> {
        let mut map = Map::new();
        self.expect('{')?;
        self.skip_whitespace();

        if self.chars.peek() == Some(&'}') {
            self.chars.next();
        } else {
            loop {
                self.skip_whitespace();
                let key = self.parse_string()?;
                self.expect(':')?;
                let value = self.parse_value()?;
                if map.insert(key.clone(), value).is_some() {
                    return Err(self.error(&format!("Duplicate key '{}'", key)));
                }

                self.skip_whitespace();
                match self.chars.next() {
                    Some(',') => {
                        self.skip_whitespace();
                        if self.chars.peek() == Some(&'}') {
                            self.chars.next();
                            break;
                        }
                    }
                    Some('}') => break,
                    Some(c) => return Err(self.error(&format!("Unexpected '{}'", c))),
                    None => return Err(self.error("Unterminated mapping")),
                }
            }
        }

        self.skip_whitespace();
        if let Some(c) = self.chars.peek().copied() {
            return Err(self.error(&format!("Trailing input starting at '{}'", c)));
        }
        Ok(map)
    }

    fn parse_value(&mut self) -> Result<Value> {
        self.skip_whitespace();
        match self.chars.peek().copied() {
            Some('\'') | Some('"') => self.parse_string().map(Value::String),
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => self.parse_number(),
            Some(c) if c.is_ascii_alphabetic() => self.parse_constant(),
            Some(c) => Err(self.error(&format!("Unsupported value starting with '{}'", c))),
            None => Err(self.error("Missing value")),
        }
    }

    fn parse_string(&mut self) -> Result<String> {
        let quote = match self.chars.next() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("Expected quoted string")),
        };

        let mut out = String::new();
        loop {
            match self.chars.next() {
                Some('\\') => match self.chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => return Err(self.error("Unterminated escape")),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(self.error("Unterminated string")),
            }
        }
    }

    fn parse_number(&mut self) -> Result<Value> {
        let mut raw = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E' | '_') {
                raw.push(c);
                self.chars.next();
            } else {
                break;
            }
        }

        let cleaned = raw.replace('_', "");
        if let Ok(int) = cleaned.parse::<i64>() {
            return Ok(Value::from(int));
        }
        cleaned
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| self.error(&format!("Invalid number '{}'", raw)))
    }

    fn parse_constant(&mut self) -> Result<Value> {
        let mut ident = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                ident.push(c);
                self.chars.next();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::Null),
            _ => Err(self.error(&format!("Unsupported identifier '{}'", ident))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawSheet;
    use crate::readers::source::MemorySource;

    fn meta_sheet(location: Cell, literal: Cell) -> RawSheet {
        RawSheet::new(vec![
            vec![Cell::Empty, Cell::from("Value")],
            vec![Cell::from(0i64), location],
            vec![Cell::from(1i64), literal],
        ])
    }

    #[test]
    fn test_parse_literal() {
        let meta = parse_metadata_literal(
            "{'yr_start': 2021, 'yr_end': 2022, 'site': \"Chinle\", 'scale': 1.5, 'ok': True, 'note': None,}",
        )
        .unwrap();

        assert_eq!(meta.yr_start, 2021);
        assert_eq!(meta.extra["yr_end"], Value::from(2022));
        assert_eq!(meta.extra["site"], Value::from("Chinle"));
        assert_eq!(meta.extra["scale"], Value::from(1.5));
        assert_eq!(meta.extra["ok"], Value::Bool(true));
        assert_eq!(meta.extra["note"], Value::Null);
    }

    #[test]
    fn test_integral_float_year_accepted() {
        let meta = parse_metadata_literal("{'yr_start': 2021.0, 'scale': 2.0}").unwrap();
        assert_eq!(meta.year(), 2021);
        // Only the year is normalized
        assert_eq!(meta.extra.get("scale"), Some(&serde_json::json!(2.0)));

        assert!(parse_metadata_literal("{'yr_start': 1e10}").is_err());
    }

    #[test]
    fn test_parse_literal_rejects_bad_input() {
        assert!(parse_metadata_literal("{'yr_end': 2021}").is_err());
        assert!(parse_metadata_literal("{'yr_start': '2021'}").is_err());
        assert!(parse_metadata_literal("{'yr_start': 2021.5}").is_err());
        assert!(parse_metadata_literal("{'yr_start': [2021]}").is_err());
        assert!(parse_metadata_literal("{'yr_start': 2021").is_err());
        assert!(parse_metadata_literal("{'yr_start': 2021} extra").is_err());
        assert!(parse_metadata_literal("{'yr_start': 1, 'yr_start': 2}").is_err());
        assert!(parse_metadata_literal("{'yr_start': __import__('os')}").is_err());
    }

    #[test]
    fn test_extract_from_source() {
        let source = MemorySource::new("meta-test").with_sheet(
            "Meta",
            meta_sheet(Cell::from(5i64), Cell::from("{'yr_start': 2021}")),
        );

        let (location, meta) = MetadataReader::new().extract(&source).unwrap();
        assert_eq!(location, 5);
        assert_eq!(meta.year(), 2021);
    }

    #[test]
    fn test_location_as_text() {
        let table = LabeledTable::with_header(&meta_sheet(
            Cell::from("12"),
            Cell::from("{'yr_start': 2022}"),
        ));
        let (location, _) = MetadataReader::new().from_table(&table).unwrap();
        assert_eq!(location, 12);
    }

    #[test]
    fn test_missing_cells_are_parse_errors() {
        let table = LabeledTable::with_header(&meta_sheet(Cell::Empty, Cell::from("{'yr_start': 2022}")));
        assert!(matches!(
            MetadataReader::new().from_table(&table),
            Err(ProcessingError::Parse(_))
        ));

        let table = LabeledTable::with_header(&meta_sheet(Cell::from(5.5), Cell::from("{'yr_start': 2022}")));
        assert!(matches!(
            MetadataReader::new().from_table(&table),
            Err(ProcessingError::Parse(_))
        ));

        let table = LabeledTable::with_header(&meta_sheet(Cell::from(5i64), Cell::from(2022i64)));
        assert!(matches!(
            MetadataReader::new().from_table(&table),
            Err(ProcessingError::Parse(_))
        ));
    }
}
