use super::column::Column;
use super::ids::EntityIndex;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntityType {
    Polymer,
    NonPolymer,
    Branched,
    Macrolide,
    Water,
    #[default]
    Unknown,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Polymer => "polymer",
            EntityType::NonPolymer => "non-polymer",
            EntityType::Branched => "branched",
            EntityType::Macrolide => "macrolide",
            EntityType::Water => "water",
            EntityType::Unknown => "?",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = ();

    /// Never fails; unrecognized strings map to [`EntityType::Unknown`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "polymer" => EntityType::Polymer,
            "non-polymer" => EntityType::NonPolymer,
            "branched" => EntityType::Branched,
            "macrolide" => EntityType::Macrolide,
            "water" => EntityType::Water,
            _ => EntityType::Unknown,
        })
    }
}

/// The `entity` table of a model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entities {
    pub id: Column<String>,
    pub entity_type: Column<EntityType>,
    pub src_method: Column<String>,
    pub pdbx_description: Column<String>,
    pub formula_weight: Column<f64>,
    pub pdbx_number_of_molecules: Column<i64>,
    pub details: Column<String>,
    index: HashMap<String, EntityIndex>,
}

/// One row of the entity table, as supplied to [`Entities::push`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityRow {
    pub id: String,
    pub entity_type: EntityType,
    pub src_method: Option<String>,
    pub description: Option<String>,
    pub formula_weight: Option<f64>,
    pub number_of_molecules: Option<i64>,
    pub details: Option<String>,
}

impl Entities {
    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// Appends a row. Returns `None` when an entity with the same id already exists.
    pub fn push(&mut self, row: EntityRow) -> Option<EntityIndex> {
        if self.index.contains_key(&row.id) {
            return None;
        }
        let idx = self.len();
        self.index.insert(row.id.clone(), idx);
        self.id.push(row.id);
        self.entity_type.push(row.entity_type);
        self.src_method.push_option(row.src_method);
        self.pdbx_description.push_option(row.description);
        self.formula_weight.push_option(row.formula_weight);
        self.pdbx_number_of_molecules.push_option(row.number_of_molecules);
        self.details.push_option(row.details);
        Some(idx)
    }

    pub fn index_of(&self, id: &str) -> Option<EntityIndex> {
        self.index.get(id).copied()
    }

    pub fn type_of(&self, index: EntityIndex) -> EntityType {
        self.entity_type
            .get(index)
            .copied()
            .unwrap_or(EntityType::Unknown)
    }
}
