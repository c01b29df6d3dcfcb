use std::collections::BTreeMap;

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    String(String),
    Real(f64),
    Integer(i64),
    Boolean(bool),
    Enum(String),
    Reference(u64),
    List(Vec<StepValue>),
    Null,
    Derived,
}

impl StepValue {
    /// Numeric value, accepting both `REAL` and `INTEGER` literals.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StepValue::Real(f) => Some(*f),
            StepValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_reference(&self) -> Option<u64> {
        match self {
            StepValue::Reference(id) => Some(*id),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StepValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[StepValue]> {
        match self {
            StepValue::List(list) => Some(list),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepEntity {
    pub id: u64,
    pub entity_type: String,
    pub values: Vec<StepValue>,
}

impl StepEntity {
    #[must_use]
    pub fn string(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(StepValue::as_str)
    }

    #[must_use]
    pub fn real(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(StepValue::as_f64)
    }

    #[must_use]
    pub fn reference(&self, index: usize) -> Option<u64> {
        self.values.get(index).and_then(StepValue::as_reference)
    }

    #[must_use]
    pub fn enumeration(&self, index: usize) -> Option<&str> {
        match self.values.get(index) {
            Some(StepValue::Enum(e)) => Some(e),
            _ => None,
        }
    }

    /// References held in a list attribute, skipping anything that is not a reference.
    #[must_use]
    pub fn references(&self, index: usize) -> Vec<u64> {
        self.values
            .get(index)
            .and_then(StepValue::as_list)
            .map(|list| list.iter().filter_map(StepValue::as_reference).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_a(&self, entity_type: &str) -> bool {
        self.entity_type == entity_type
    }
}

/// An ISO 10303-21 exchange file reduced to its schema and instances.
///
/// Instances are kept ordered by id so that every query over the file
/// yields the same order from run to run.
#[derive(Debug)]
pub struct StepFile {
    pub entities: BTreeMap<u64, StepEntity>,
    pub schema: String,
}

impl StepFile {
    pub fn parse(content: &str) -> Result<Self, ParseError> {
        let mut entities = BTreeMap::new();
        let mut schema = String::new();
        let mut in_data = false;
        let mut saw_data = false;

        for statement in split_statements(content) {
            let statement = statement.trim();

            if statement.starts_with("FILE_SCHEMA") {
                if let Some(start) = statement.find('\'') {
                    if let Some(end) = statement[start + 1..].find('\'') {
                        schema = statement[start + 1..start + 1 + end].to_string();
                    }
                }
                continue;
            }

            if statement == "DATA" {
                in_data = true;
                saw_data = true;
                continue;
            }
            if statement == "ENDSEC" {
                in_data = false;
                continue;
            }

            if in_data && statement.starts_with('#') {
                match Self::parse_entity(statement) {
                    Some(entity) => {
                        entities.insert(entity.id, entity);
                    }
                    None => log::debug!(statement = statement; "Skipping unparseable instance"),
                }
            }
        }

        if !saw_data {
            return Err(ParseError::InvalidStep {
                message: "missing DATA section".to_string(),
            });
        }

        Ok(StepFile { entities, schema })
    }

    fn parse_entity(statement: &str) -> Option<StepEntity> {
        // Format: #123=IFCWALL('guid',#ref,'name',...)
        let eq_pos = statement.find('=')?;
        let id: u64 = statement[1..eq_pos].trim().parse().ok()?;

        let rest = statement[eq_pos + 1..].trim();
        let paren_pos = rest.find('(')?;
        let entity_type = rest[..paren_pos].trim().to_ascii_uppercase();

        let close = rest.rfind(')')?;
        if close <= paren_pos {
            return None;
        }
        let values = Self::parse_values(&rest[paren_pos + 1..close]);

        Some(StepEntity {
            id,
            entity_type,
            values,
        })
    }

    fn parse_values(s: &str) -> Vec<StepValue> {
        let mut values = Vec::new();
        let mut current = String::new();
        let mut in_string = false;
        let mut paren_depth = 0usize;

        for ch in s.chars() {
            match ch {
                '\'' => {
                    in_string = !in_string;
                    current.push(ch);
                }
                '(' if !in_string => {
                    paren_depth += 1;
                    current.push(ch);
                }
                ')' if !in_string => {
                    paren_depth = paren_depth.saturating_sub(1);
                    current.push(ch);
                }
                ',' if !in_string && paren_depth == 0 => {
                    values.push(Self::parse_single_value(current.trim()));
                    current.clear();
                }
                _ => current.push(ch),
            }
        }

        if !current.trim().is_empty() {
            values.push(Self::parse_single_value(current.trim()));
        }

        values
    }

    fn parse_single_value(s: &str) -> StepValue {
        let s = s.trim();

        if s == "$" {
            return StepValue::Null;
        }
        if s == "*" {
            return StepValue::Derived;
        }
        if let Some(stripped) = s.strip_prefix('#') {
            if let Ok(id) = stripped.parse::<u64>() {
                return StepValue::Reference(id);
            }
        }
        if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
            let raw = &s[1..s.len() - 1];
            return StepValue::String(decode_step_string(raw));
        }
        if s.len() >= 2 && s.starts_with('.') && s.ends_with('.') {
            let inner = &s[1..s.len() - 1];
            return match inner {
                "T" => StepValue::Boolean(true),
                "F" => StepValue::Boolean(false),
                _ => StepValue::Enum(inner.to_string()),
            };
        }
        if s.starts_with('(') && s.ends_with(')') {
            let inner = &s[1..s.len() - 1];
            return StepValue::List(Self::parse_values(inner));
        }
        if let Ok(i) = s.parse::<i64>() {
            return StepValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return StepValue::Real(f);
        }
        // Typed value like IFCBOOLEAN(.T.)
        if let Some(paren_pos) = s.find('(') {
            if s.ends_with(')') {
                let inner = &s[paren_pos + 1..s.len() - 1];
                return Self::parse_single_value(inner);
            }
        }

        StepValue::String(s.to_string())
    }

    #[must_use]
    pub fn get_entity(&self, id: u64) -> Option<&StepEntity> {
        self.entities.get(&id)
    }

    /// All instances of `entity_type`, in ascending id order.
    #[must_use]
    pub fn get_entities_by_type(&self, entity_type: &str) -> Vec<&StepEntity> {
        self.entities
            .values()
            .filter(|e| e.entity_type == entity_type)
            .collect()
    }
}

/// Split the exchange file into `;`-terminated statements.
///
/// Semicolons inside string literals and `/* */` comments do not terminate
/// a statement, and a statement may span any number of lines.
fn split_statements(content: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                in_string = !in_string;
                current.push(ch);
            }
            '/' if !in_string && chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            ';' if !in_string => {
                statements.push(std::mem::take(&mut current));
            }
            '\r' | '\n' if !in_string => {}
            _ => current.push(ch),
        }
    }

    if !current.trim().is_empty() {
        statements.push(current);
    }

    statements
}

/// Decode STEP/IFC encoded strings with Unicode escape sequences.
/// Supports:
/// - `\X2\XXXX\X0\` - 2-byte Unicode (BMP), can have multiple 4-char hex codes
/// - `\X\XX` - 1-byte ISO 8859-1
/// - `\S\X` - ISO 8859-1 high half
/// - `\\` - escaped backslash
/// - `''` - escaped apostrophe
fn decode_step_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.peek() {
                Some('X') => {
                    chars.next(); // consume 'X'
                    match chars.peek() {
                        Some('2') => {
                            chars.next(); // consume '2'
                            chars.next(); // consume '\'

                            let mut hex = String::new();
                            while let Some(&c) = chars.peek() {
                                if c == '\\' {
                                    break;
                                }
                                hex.push(c);
                                chars.next();
                            }
                            // Skip \X0\
                            if chars.peek() == Some(&'\\') {
                                for _ in 0..4 {
                                    chars.next();
                                }
                            }
                            for chunk in hex.as_bytes().chunks(4) {
                                let decoded = std::str::from_utf8(chunk)
                                    .ok()
                                    .and_then(|h| u32::from_str_radix(h, 16).ok())
                                    .and_then(char::from_u32);
                                if let Some(c) = decoded {
                                    result.push(c);
                                }
                            }
                        }
                        Some('\\') => {
                            chars.next(); // consume '\'
                            let hex: String = chars.by_ref().take(2).collect();
                            if let Ok(code) = u8::from_str_radix(&hex, 16) {
                                result.push(char::from(code));
                            }
                        }
                        _ => {
                            result.push('\\');
                            result.push('X');
                        }
                    }
                }
                Some('\\') => {
                    chars.next();
                    result.push('\\');
                }
                Some('S') => {
                    chars.next(); // 'S'
                    chars.next(); // '\'
                    if let Some(c) = chars.next() {
                        if let Ok(low) = u8::try_from(u32::from(c)) {
                            result.push(char::from(low | 0x80));
                        }
                    }
                }
                _ => result.push('\\'),
            }
        } else if ch == '\'' {
            // '' is escaped apostrophe in STEP
            if chars.peek() == Some(&'\'') {
                chars.next();
            }
            result.push('\'');
        } else {
            result.push(ch);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCCARTESIANPOINT((0.,0.,1.5E3));
#2=IFCWALL('2O2Fr$t4X7Zf8NOew3FLOH',$,'Wall; with (odd) name',$,$,#1,$,'Tag',.STANDARD.);
#3=IFCPROPERTYSINGLEVALUE('LoadBearing',$,IFCBOOLEAN(.T.),$);
#4=IFCRELCONTAINEDINSPATIALSTRUCTURE('0Lt8gR_E9ESeGH5uY_g9e9',$,$,$,
  (#2,#3),#1);
/* trailing comment; with semicolon */
ENDSEC;
END-ISO-10303-21;
";

    #[test]
    fn parses_schema_and_entities() {
        let file = StepFile::parse(SAMPLE).unwrap();
        assert_eq!(file.schema, "IFC4");
        assert_eq!(file.entities.len(), 4);

        let point = file.get_entity(1).unwrap();
        assert_eq!(
            point.values[0],
            StepValue::List(vec![StepValue::Real(0.0), StepValue::Real(0.0), StepValue::Real(1500.0)])
        );
    }

    #[test]
    fn strings_may_contain_separators() {
        let file = StepFile::parse(SAMPLE).unwrap();
        let wall = file.get_entity(2).unwrap();
        assert_eq!(wall.entity_type, "IFCWALL");
        assert_eq!(wall.string(2), Some("Wall; with (odd) name"));
        assert_eq!(wall.reference(5), Some(1));
        assert_eq!(wall.enumeration(8), Some("STANDARD"));
    }

    #[test]
    fn typed_values_are_unwrapped() {
        let file = StepFile::parse(SAMPLE).unwrap();
        let prop = file.get_entity(3).unwrap();
        assert_eq!(prop.values.get(2), Some(&StepValue::Boolean(true)));
    }

    #[test]
    fn instances_may_span_lines() {
        let file = StepFile::parse(SAMPLE).unwrap();
        let rel = file.get_entity(4).unwrap();
        assert_eq!(rel.references(4), vec![2, 3]);
        assert_eq!(rel.reference(5), Some(1));
    }

    #[test]
    fn missing_data_section_is_an_error() {
        let result = StepFile::parse("ISO-10303-21;\nHEADER;\nENDSEC;\n");
        assert!(matches!(result, Err(ParseError::InvalidStep { .. })));
    }

    #[test]
    fn decodes_escapes() {
        assert_eq!(decode_step_string("Etage \\X2\\00F8\\X0\\st"), "Etage øst");
        assert_eq!(decode_step_string("K\\X\\E6lder"), "Kælder");
        assert_eq!(decode_step_string("it''s"), "it's");
        assert_eq!(decode_step_string("a\\\\b"), "a\\b");
    }

    #[test]
    fn entities_by_type_are_ordered_by_id() {
        let content = "DATA;\n#9=IFCBEAM('a');\n#3=IFCBEAM('b');\n#5=IFCSLAB('c');\nENDSEC;\n";
        let file = StepFile::parse(content).unwrap();
        let ids: Vec<u64> = file
            .get_entities_by_type("IFCBEAM")
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![3, 9]);
    }
}
