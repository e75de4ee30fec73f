use super::ModelError;

/// Presence marker of a single table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueKind {
    #[default]
    Present,
    /// Explicitly absent (`.` in CIF).
    NotPresent,
    /// Unknown (`?` in CIF).
    Unknown,
}

/// A typed table column with optional per-row presence markers.
///
/// Rows that are not present still hold a default value so that `value(row)`
/// is total over `0..len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Column<T> {
    values: Vec<T>,
    kinds: Option<Vec<ValueKind>>,
}

impl<T> Default for Column<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            kinds: None,
        }
    }
}

impl<T> Column<T> {
    pub fn new(values: Vec<T>) -> Self {
        Self {
            values,
            kinds: None,
        }
    }

    pub fn with_kinds(values: Vec<T>, kinds: Vec<ValueKind>) -> Result<Self, ModelError> {
        if values.len() != kinds.len() {
            return Err(ModelError::InvalidValue(format!(
                "column has {} values but {} value kinds",
                values.len(),
                kinds.len()
            )));
        }
        let kinds = kinds
            .iter()
            .any(|k| *k != ValueKind::Present)
            .then_some(kinds);
        Ok(Self { values, kinds })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.len()`.
    #[inline]
    pub fn value(&self, row: usize) -> &T {
        &self.values[row]
    }

    #[inline]
    pub fn get(&self, row: usize) -> Option<&T> {
        self.values.get(row)
    }

    #[inline]
    pub fn value_kind(&self, row: usize) -> ValueKind {
        match &self.kinds {
            Some(kinds) => kinds.get(row).copied().unwrap_or(ValueKind::NotPresent),
            None if row < self.values.len() => ValueKind::Present,
            None => ValueKind::NotPresent,
        }
    }

    /// Value at `row` if it is marked present.
    pub fn present(&self, row: usize) -> Option<&T> {
        match self.value_kind(row) {
            ValueKind::Present => self.values.get(row),
            _ => None,
        }
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn push(&mut self, value: T) {
        self.values.push(value);
        if let Some(kinds) = &mut self.kinds {
            kinds.push(ValueKind::Present);
        }
    }

    pub fn push_with_kind(&mut self, value: T, kind: ValueKind) {
        if kind != ValueKind::Present && self.kinds.is_none() {
            self.kinds = Some(vec![ValueKind::Present; self.values.len()]);
        }
        self.values.push(value);
        if let Some(kinds) = &mut self.kinds {
            kinds.push(kind);
        }
    }
}

impl<T: Default> Column<T> {
    /// Builds a column where `None` rows are marked [`ValueKind::NotPresent`].
    pub fn from_options(values: impl IntoIterator<Item = Option<T>>) -> Self {
        let mut column = Self::default();
        for value in values {
            column.push_option(value);
        }
        column
    }

    pub fn push_option(&mut self, value: Option<T>) {
        match value {
            Some(v) => self.push(v),
            None => self.push_with_kind(T::default(), ValueKind::NotPresent),
        }
    }
}

impl<T> FromIterator<T> for Column<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
