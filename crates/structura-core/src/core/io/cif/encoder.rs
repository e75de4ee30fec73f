use super::CifExportError;
use crate::core::models::column::ValueKind;

type StrFn<K, D> = Box<dyn Fn(&K, &D) -> String>;
type IntFn<K, D> = Box<dyn Fn(&K, &D) -> i64>;
type FloatFn<K, D> = Box<dyn Fn(&K, &D) -> f64>;
type ValueKindFn<K, D> = Box<dyn Fn(&K, &D) -> ValueKind>;

pub const DEFAULT_FLOAT_PRECISION: usize = 3;

/// Scalar kind of a field together with its extraction function.
pub enum FieldValue<K, D> {
    Str(StrFn<K, D>),
    Int(IntFn<K, D>),
    Float { value: FloatFn<K, D>, precision: usize },
}

/// One named column of a category.
///
/// The value function is only invoked for rows whose value kind is
/// [`ValueKind::Present`].
pub struct FieldDefinition<K, D> {
    pub name: &'static str,
    pub value: FieldValue<K, D>,
    pub value_kind: Option<ValueKindFn<K, D>>,
}

impl<K, D> FieldDefinition<K, D> {
    pub fn str(name: &'static str, value: impl Fn(&K, &D) -> String + 'static) -> Self {
        Self {
            name,
            value: FieldValue::Str(Box::new(value)),
            value_kind: None,
        }
    }

    pub fn int(name: &'static str, value: impl Fn(&K, &D) -> i64 + 'static) -> Self {
        Self {
            name,
            value: FieldValue::Int(Box::new(value)),
            value_kind: None,
        }
    }

    pub fn float(name: &'static str, value: impl Fn(&K, &D) -> f64 + 'static) -> Self {
        Self::float_with_precision(name, DEFAULT_FLOAT_PRECISION, value)
    }

    pub fn float_with_precision(
        name: &'static str,
        precision: usize,
        value: impl Fn(&K, &D) -> f64 + 'static,
    ) -> Self {
        Self {
            name,
            value: FieldValue::Float {
                value: Box::new(value),
                precision,
            },
            value_kind: None,
        }
    }

    pub fn with_value_kind(mut self, value_kind: impl Fn(&K, &D) -> ValueKind + 'static) -> Self {
        self.value_kind = Some(Box::new(value_kind));
        self
    }

    fn render(&self, key: &K, data: &D) -> String {
        let kind = self
            .value_kind
            .as_ref()
            .map_or(ValueKind::Present, |f| f(key, data));
        match kind {
            ValueKind::NotPresent => return ".".to_string(),
            ValueKind::Unknown => return "?".to_string(),
            ValueKind::Present => {}
        }
        match &self.value {
            FieldValue::Str(f) => escape_value(&f(key, data)),
            FieldValue::Int(f) => f(key, data).to_string(),
            FieldValue::Float { value, precision } => format_float(value(key, data), *precision),
        }
    }
}

/// A category name and its ordered fields.
pub struct CategoryDefinition<K, D> {
    pub name: &'static str,
    pub fields: Vec<FieldDefinition<K, D>>,
}

/// A category definition bound to concrete data and a row-key sequence.
pub struct CategoryInstance<'a, K, D> {
    pub definition: &'a CategoryDefinition<K, D>,
    pub data: &'a D,
    pub keys: Box<dyn Iterator<Item = K> + 'a>,
    pub row_count: usize,
}

/// Text CIF writer producing a single string.
#[derive(Debug, Default)]
pub struct CifEncoder {
    out: String,
}

impl CifEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_data_block(&mut self, name: &str) {
        let name = name.trim();
        let name = if name.is_empty() { "structure" } else { name };
        self.out.push_str("data_");
        self.out.push_str(&name.replace(char::is_whitespace, "_"));
        self.out.push_str("\n#\n");
    }

    /// Writes `row_count` rows of the instance in key order. Categories without
    /// rows or fields are skipped.
    pub fn write_category<K, D>(&mut self, instance: CategoryInstance<'_, K, D>) -> Result<(), CifExportError> {
        let CategoryInstance {
            definition,
            data,
            keys,
            row_count,
        } = instance;
        if row_count == 0 {
            let actual = keys.count();
            if actual != 0 {
                return Err(row_count_mismatch(definition.name, 0, actual));
            }
            return Ok(());
        }
        if definition.fields.is_empty() {
            return Ok(());
        }

        let mut rows = Vec::with_capacity(row_count);
        for key in keys {
            if rows.len() == row_count {
                return Err(row_count_mismatch(definition.name, row_count, row_count + 1));
            }
            rows.push(
                definition
                    .fields
                    .iter()
                    .map(|f| f.render(&key, data))
                    .collect::<Vec<_>>(),
            );
        }
        if rows.len() != row_count {
            return Err(row_count_mismatch(definition.name, row_count, rows.len()));
        }

        if row_count == 1 {
            self.write_single_row(definition, &rows[0]);
        } else {
            self.write_loop(definition, &rows);
        }
        self.out.push_str("#\n");
        Ok(())
    }

    fn write_single_row<K, D>(&mut self, definition: &CategoryDefinition<K, D>, row: &[String]) {
        let width = definition
            .fields
            .iter()
            .map(|f| definition.name.len() + f.name.len() + 2)
            .max()
            .unwrap_or(0);
        for (field, value) in definition.fields.iter().zip(row) {
            let key = format!("_{}.{}", definition.name, field.name);
            self.out.push_str(&format!("{key:<width$} {value}\n"));
        }
    }

    fn write_loop<K, D>(&mut self, definition: &CategoryDefinition<K, D>, rows: &[Vec<String>]) {
        self.out.push_str("loop_\n");
        for field in &definition.fields {
            self.out
                .push_str(&format!("_{}.{}\n", definition.name, field.name));
        }
        for row in rows {
            self.out.push_str(&row.join(" "));
            self.out.push('\n');
        }
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

fn row_count_mismatch(category: &str, expected: usize, actual: usize) -> CifExportError {
    CifExportError::RowCountMismatch {
        category: category.to_string(),
        expected,
        actual,
    }
}

fn format_float(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return "?".to_string();
    }
    let s = format!("{value:.precision$}");
    if s.starts_with('-') && s[1..].bytes().all(|b| b == b'0' || b == b'.') {
        s[1..].to_string()
    } else {
        s
    }
}

const RESERVED_PREFIXES: [&str; 5] = ["data_", "loop_", "save_", "global_", "stop_"];

/// Quotes a string value so that it reads back as a single token.
pub fn escape_value(s: &str) -> String {
    if s.is_empty() {
        return ".".to_string();
    }
    if s.contains('\n') {
        return format!("\n;{s}\n;");
    }
    let needs_quotes = s.contains(char::is_whitespace)
        || s.contains('\'')
        || s.contains('"')
        || s == "."
        || s == "?"
        || s.starts_with(['_', '#', '$', '[', ']', ';'])
        || RESERVED_PREFIXES
            .iter()
            .any(|p| s.len() >= p.len() && s[..p.len()].eq_ignore_ascii_case(p));
    if !needs_quotes {
        s.to_string()
    } else if !s.contains('\'') {
        format!("'{s}'")
    } else if !s.contains('"') {
        format!("\"{s}\"")
    } else {
        format!("\n;{s}\n;")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        name: &'static str,
        count: i64,
        weight: Option<f64>,
    }

    fn category() -> CategoryDefinition<usize, Vec<Row>> {
        CategoryDefinition {
            name: "sample",
            fields: vec![
                FieldDefinition::str("name", |&i: &usize, d: &Vec<Row>| d[i].name.to_string()),
                FieldDefinition::int("count", |&i: &usize, d: &Vec<Row>| d[i].count),
                FieldDefinition::float("weight", |&i: &usize, d: &Vec<Row>| match d[i].weight {
                    Some(w) => w,
                    None => panic!("weight read for row {i}, which has none"),
                })
                    .with_value_kind(|&i: &usize, d: &Vec<Row>| {
                        if d[i].weight.is_some() {
                            ValueKind::Present
                        } else {
                            ValueKind::NotPresent
                        }
                    }),
            ],
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                name: "alpha",
                count: 1,
                weight: Some(1.5),
            },
            Row {
                name: "beta gamma",
                count: 2,
                weight: None,
            },
        ]
    }

    fn encode(data: &Vec<Row>, row_count: usize, keys: Vec<usize>) -> Result<String, CifExportError> {
        let definition = category();
        let mut encoder = CifEncoder::new();
        encoder.start_data_block("test block");
        encoder.write_category(CategoryInstance {
            definition: &definition,
            data,
            keys: Box::new(keys.into_iter()),
            row_count,
        })?;
        Ok(encoder.into_string())
    }

    mod values {
        use super::*;

        #[test]
        fn escape_value_quotes_only_when_needed() {
            assert_eq!(escape_value("ALA"), "ALA");
            assert_eq!(escape_value(""), ".");
            assert_eq!(escape_value("two words"), "'two words'");
            assert_eq!(escape_value("O5'"), "\"O5'\"");
            assert_eq!(escape_value("?"), "'?'");
            assert_eq!(escape_value("_tag"), "'_tag'");
            assert_eq!(escape_value("data_x"), "'data_x'");
            assert_eq!(escape_value("line\nbreak"), "\n;line\nbreak\n;");
        }

        #[test]
        fn floats_use_fixed_precision_without_negative_zero() {
            assert_eq!(format_float(1.23456, 3), "1.235");
            assert_eq!(format_float(-0.0001, 3), "0.000");
            assert_eq!(format_float(-2.5, 2), "-2.50");
            assert_eq!(format_float(f64::NAN, 3), "?");
        }
    }

    mod categories {
        use super::*;

        #[test]
        fn data_block_name_has_no_whitespace() {
            let out = encode(&rows(), 0, vec![]).unwrap();
            assert!(out.starts_with("data_test_block\n"));
        }

        #[test]
        fn multiple_rows_are_written_as_a_loop() {
            let out = encode(&rows(), 2, vec![0, 1]).unwrap();
            assert!(out.contains("loop_\n_sample.name\n_sample.count\n_sample.weight\n"));
            assert!(out.contains("alpha 1 1.500\n"));
            assert!(out.contains("'beta gamma' 2 .\n"));
            assert!(out.ends_with("#\n"));
        }

        #[test]
        fn single_row_is_written_as_key_value_pairs() {
            let out = encode(&rows(), 1, vec![1]).unwrap();
            assert!(!out.contains("loop_"));
            assert!(out.contains("_sample.name   'beta gamma'\n"));
            assert!(out.contains("_sample.weight .\n"));
        }

        #[test]
        fn rows_follow_key_order() {
            let out = encode(&rows(), 2, vec![1, 0]).unwrap();
            let beta = out.find("'beta gamma'").unwrap();
            let alpha = out.find("alpha").unwrap();
            assert!(beta < alpha);
        }

        #[test]
        fn empty_category_is_skipped() {
            let out = encode(&rows(), 0, vec![]).unwrap();
            assert!(!out.contains("_sample"));
        }

        #[test]
        fn missing_values_skip_the_value_function() {
            let out = encode(&rows(), 2, vec![1, 1]).unwrap();
            assert_eq!(out.matches("'beta gamma' 2 .\n").count(), 2);
        }

        #[test]
        fn keys_for_an_empty_category_are_a_mismatch() {
            let result = encode(&rows(), 0, vec![0, 1]);
            assert!(matches!(
                result,
                Err(CifExportError::RowCountMismatch {
                    expected: 0,
                    actual: 2,
                    ..
                })
            ));
        }

        #[test]
        fn key_count_must_match_row_count() {
            let too_few = encode(&rows(), 2, vec![0]);
            assert!(matches!(
                too_few,
                Err(CifExportError::RowCountMismatch {
                    expected: 2,
                    actual: 1,
                    ..
                })
            ));
            let too_many = encode(&rows(), 1, vec![0, 1]);
            assert!(matches!(
                too_many,
                Err(CifExportError::RowCountMismatch { expected: 1, .. })
            ));
        }
    }
}
