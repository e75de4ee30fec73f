use super::column::Column;
use std::collections::HashMap;
use std::ops::{BitOr, BitOrAssign};

/// Bit flags describing the chemistry of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LinkFlags(u8);

impl LinkFlags {
    pub const NONE: Self = Self(0);
    pub const COVALENT: Self = Self(0x1);
    pub const METALLIC_COORDINATION: Self = Self(0x2);
    pub const AROMATIC: Self = Self(0x4);
    pub const DISULFIDE: Self = Self(0x8);

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for LinkFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for LinkFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// mmCIF `value_order` to a numeric bond order. Unrecognized values count as single bonds.
pub fn parse_bond_order(value_order: &str) -> u8 {
    match value_order.trim().to_ascii_lowercase().as_str() {
        "doub" | "delo" => 2,
        "trip" => 3,
        "quad" => 4,
        _ => 1,
    }
}

/// Raw `chem_comp_bond` rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentBondTable {
    pub comp_id: Column<String>,
    pub atom_id_1: Column<String>,
    pub atom_id_2: Column<String>,
    pub value_order: Column<String>,
    pub pdbx_aromatic_flag: Column<String>,
}

impl ComponentBondTable {
    pub fn len(&self) -> usize {
        self.comp_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comp_id.is_empty()
    }

    pub fn push(&mut self, comp_id: &str, atom_a: &str, atom_b: &str, value_order: &str, aromatic: bool) {
        self.comp_id.push(comp_id.to_string());
        self.atom_id_1.push(atom_a.to_string());
        self.atom_id_2.push(atom_b.to_string());
        self.value_order.push(value_order.to_string());
        self.pdbx_aromatic_flag
            .push(if aromatic { "Y" } else { "N" }.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentBondInfo {
    pub order: u8,
    pub flags: LinkFlags,
}

/// Symmetric atom-name pair lookup for one chemical component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentBondEntry {
    pub id: String,
    map: HashMap<String, HashMap<String, ComponentBondInfo>>,
}

impl ComponentBondEntry {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            map: HashMap::new(),
        }
    }

    /// The first definition of a pair wins.
    fn add(&mut self, a: &str, b: &str, info: ComponentBondInfo) {
        self.map
            .entry(a.to_string())
            .or_default()
            .entry(b.to_string())
            .or_insert(info);
        self.map
            .entry(b.to_string())
            .or_default()
            .entry(a.to_string())
            .or_insert(info);
    }

    pub fn get(&self, a: &str, b: &str) -> Option<ComponentBondInfo> {
        self.map.get(a)?.get(b).copied()
    }

    pub fn atom_names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }
}

/// Component bonds keyed by `comp_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentBonds {
    entries: HashMap<String, ComponentBondEntry>,
}

impl ComponentBonds {
    pub fn from_table(table: &ComponentBondTable) -> Self {
        let mut entries: HashMap<String, ComponentBondEntry> = HashMap::new();
        for row in 0..table.len() {
            let comp_id = table.comp_id.value(row);
            let mut flags = LinkFlags::COVALENT;
            if table.pdbx_aromatic_flag.present(row).is_some_and(|f| f == "Y") {
                flags |= LinkFlags::AROMATIC;
            }
            let info = ComponentBondInfo {
                order: parse_bond_order(table.value_order.value(row)),
                flags,
            };
            entries
                .entry(comp_id.clone())
                .or_insert_with(|| ComponentBondEntry::new(comp_id))
                .add(table.atom_id_1.value(row), table.atom_id_2.value(row), info);
        }
        Self { entries }
    }

    pub fn entry(&self, comp_id: &str) -> Option<&ComponentBondEntry> {
        self.entries.get(comp_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> ComponentBondTable {
        let mut t = ComponentBondTable::default();
        t.push("ALA", "N", "CA", "sing", false);
        t.push("ALA", "CA", "C", "sing", false);
        t.push("ALA", "C", "O", "doub", false);
        t.push("PHE", "CG", "CD1", "delo", true);
        t.push("ALA", "N", "CA", "trip", false);
        t
    }

    #[test]
    fn bond_order_parsing_follows_mmcif_vocabulary() {
        assert_eq!(parse_bond_order("sing"), 1);
        assert_eq!(parse_bond_order("DOUB"), 2);
        assert_eq!(parse_bond_order("delo"), 2);
        assert_eq!(parse_bond_order("trip"), 3);
        assert_eq!(parse_bond_order("quad"), 4);
        assert_eq!(parse_bond_order("arom"), 1);
    }

    #[test]
    fn link_flags_combine_and_test() {
        let f = LinkFlags::COVALENT | LinkFlags::AROMATIC;
        assert!(f.contains(LinkFlags::COVALENT));
        assert!(f.contains(LinkFlags::AROMATIC));
        assert!(!f.contains(LinkFlags::DISULFIDE));
        assert!(LinkFlags::NONE.is_empty());
        assert_eq!(f.bits(), 0x5);
    }

    #[test]
    fn lookup_is_symmetric() {
        let bonds = ComponentBonds::from_table(&sample_table());
        let ala = bonds.entry("ALA").unwrap();
        assert_eq!(ala.get("C", "O"), ala.get("O", "C"));
        assert_eq!(ala.get("C", "O").unwrap().order, 2);
        assert!(ala.get("N", "O").is_none());
    }

    #[test]
    fn first_definition_of_a_pair_wins() {
        let bonds = ComponentBonds::from_table(&sample_table());
        assert_eq!(bonds.entry("ALA").unwrap().get("CA", "N").unwrap().order, 1);
    }

    #[test]
    fn aromatic_flag_is_carried() {
        let bonds = ComponentBonds::from_table(&sample_table());
        let info = bonds.entry("PHE").unwrap().get("CD1", "CG").unwrap();
        assert!(info.flags.contains(LinkFlags::AROMATIC | LinkFlags::COVALENT));
        assert_eq!(bonds.len(), 2);
    }
}
