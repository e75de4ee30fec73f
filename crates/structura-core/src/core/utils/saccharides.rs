//! Monosaccharide component table following the Symbol Nomenclature for Glycans (SNFG).

use phf::{Map, phf_map};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaccharideType {
    Hexose,
    HexNAc,
    Hexosamine,
    HexA,
    DeoxyHexose,
    DeoxyHexNAc,
    DiDeoxyHexose,
    Pentose,
    Deoxynonulosonate,
    DiDeoxynonulosonate,
    Unknown,
    Assigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaccharideComponent {
    pub abbr: &'static str,
    pub name: &'static str,
    pub saccharide_type: SaccharideType,
    /// SNFG symbol color as `0xRRGGBB`.
    pub color: u32,
    /// Ketoses close their ring on C2 instead of C1.
    pub is_ketose: bool,
}

const fn component(
    abbr: &'static str,
    name: &'static str,
    saccharide_type: SaccharideType,
    color: u32,
    is_ketose: bool,
) -> SaccharideComponent {
    SaccharideComponent {
        abbr,
        name,
        saccharide_type,
        color,
        is_ketose,
    }
}

const BLUE: u32 = 0x0090BC;
const GREEN: u32 = 0x00A651;
const YELLOW: u32 = 0xFFD400;
const ORANGE: u32 = 0xF47920;
const RED: u32 = 0xED1C24;
const PURPLE: u32 = 0xA54399;
const BROWN: u32 = 0xA17A4D;
const LIGHT_BLUE: u32 = 0x8FCCE9;

static MONOSACCHARIDES: Map<&'static str, SaccharideComponent> = phf_map! {
    "GLC" => component("Glc", "Glucose", SaccharideType::Hexose, BLUE, false),
    "BGC" => component("Glc", "Glucose", SaccharideType::Hexose, BLUE, false),
    "MAN" => component("Man", "Mannose", SaccharideType::Hexose, GREEN, false),
    "BMA" => component("Man", "Mannose", SaccharideType::Hexose, GREEN, false),
    "GAL" => component("Gal", "Galactose", SaccharideType::Hexose, YELLOW, false),
    "GLA" => component("Gal", "Galactose", SaccharideType::Hexose, YELLOW, false),
    "TAL" => component("Tal", "Talose", SaccharideType::Hexose, LIGHT_BLUE, false),
    "NAG" => component("GlcNAc", "N-Acetyl Glucosamine", SaccharideType::HexNAc, BLUE, false),
    "NDG" => component("GlcNAc", "N-Acetyl Glucosamine", SaccharideType::HexNAc, BLUE, false),
    "NGA" => component("GalNAc", "N-Acetyl Galactosamine", SaccharideType::HexNAc, YELLOW, false),
    "A2G" => component("GalNAc", "N-Acetyl Galactosamine", SaccharideType::HexNAc, YELLOW, false),
    "BM3" => component("ManNAc", "N-Acetyl Mannosamine", SaccharideType::HexNAc, GREEN, false),
    "GCS" => component("GlcN", "Glucosamine", SaccharideType::Hexosamine, BLUE, false),
    "PA1" => component("GlcN", "Glucosamine", SaccharideType::Hexosamine, BLUE, false),
    "GCU" => component("GlcA", "Glucuronic Acid", SaccharideType::HexA, BLUE, false),
    "BDP" => component("GlcA", "Glucuronic Acid", SaccharideType::HexA, BLUE, false),
    "IDR" => component("IdoA", "Iduronic Acid", SaccharideType::HexA, BROWN, false),
    "FUC" => component("Fuc", "Fucose", SaccharideType::DeoxyHexose, RED, false),
    "FUL" => component("Fuc", "Fucose", SaccharideType::DeoxyHexose, RED, false),
    "RAM" => component("Rha", "Rhamnose", SaccharideType::DeoxyHexose, GREEN, false),
    "XYS" => component("Xyl", "Xylose", SaccharideType::Pentose, ORANGE, false),
    "XYP" => component("Xyl", "Xylose", SaccharideType::Pentose, ORANGE, false),
    "ARA" => component("Ara", "Arabinose", SaccharideType::Pentose, GREEN, false),
    "RIB" => component("Rib", "Ribose", SaccharideType::Pentose, PURPLE, false),
    "SIA" => component("Neu5Ac", "N-Acetyl Neuraminic Acid", SaccharideType::Deoxynonulosonate, PURPLE, true),
    "SLB" => component("Neu5Ac", "N-Acetyl Neuraminic Acid", SaccharideType::Deoxynonulosonate, PURPLE, true),
    "NGC" => component("Neu5Gc", "N-Glycolyl Neuraminic Acid", SaccharideType::Deoxynonulosonate, LIGHT_BLUE, true),
    "KDO" => component("Kdo", "Keto-Deoxy Octulonic Acid", SaccharideType::Assigned, YELLOW, true),
    "FRU" => component("Fru", "Fructose", SaccharideType::Assigned, GREEN, true),
};

pub fn saccharide_component(comp_id: &str) -> Option<&'static SaccharideComponent> {
    MONOSACCHARIDES.get(comp_id.trim())
}

pub fn is_saccharide(comp_id: &str) -> bool {
    MONOSACCHARIDES.contains_key(comp_id.trim())
}
