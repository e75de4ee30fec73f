use phf::{Map, Set, phf_map, phf_set};

static COVALENT_RADII: Map<&'static str, f64> = phf_map! {
    "H" => 0.31, "D" => 0.31, "HE" => 0.28,
    "LI" => 1.28, "BE" => 0.96, "B" => 0.84, "C" => 0.76, "N" => 0.71, "O" => 0.66, "F" => 0.57,
    "NA" => 1.66, "MG" => 1.41, "AL" => 1.21, "SI" => 1.11, "P" => 1.07, "S" => 1.05, "CL" => 1.02,
    "K" => 2.03, "CA" => 1.76, "V" => 1.53, "CR" => 1.39, "MN" => 1.39, "FE" => 1.32, "CO" => 1.26,
    "NI" => 1.24, "CU" => 1.32, "ZN" => 1.22, "GA" => 1.22, "AS" => 1.19, "SE" => 1.20, "BR" => 1.20,
    "RB" => 2.20, "SR" => 1.95, "MO" => 1.54, "RU" => 1.46, "RH" => 1.42, "PD" => 1.39, "AG" => 1.45,
    "CD" => 1.44, "SN" => 1.39, "I" => 1.39, "CS" => 2.44, "BA" => 2.15, "W" => 1.62, "OS" => 1.44,
    "IR" => 1.41, "PT" => 1.36, "AU" => 1.36, "HG" => 1.32, "PB" => 1.46, "U" => 1.96,
};

static VDW_RADII: Map<&'static str, f64> = phf_map! {
    "H" => 1.10, "D" => 1.10, "C" => 1.70, "N" => 1.55, "O" => 1.52, "F" => 1.47, "P" => 1.80,
    "S" => 1.80, "CL" => 1.75, "BR" => 1.85, "I" => 1.98, "SE" => 1.90, "NA" => 2.27, "MG" => 1.73,
    "K" => 2.75, "CA" => 2.31, "MN" => 2.05, "FE" => 2.04, "CO" => 2.00, "NI" => 1.63, "CU" => 1.40,
    "ZN" => 1.39,
};

static METALS: Set<&'static str> = phf_set! {
    "LI", "BE", "NA", "MG", "AL", "K", "CA", "V", "CR", "MN", "FE", "CO", "NI", "CU", "ZN", "GA",
    "RB", "SR", "MO", "RU", "RH", "PD", "AG", "CD", "SN", "CS", "BA", "W", "OS", "IR", "PT", "AU",
    "HG", "PB", "U",
};

static POLYMER_TRACE_ATOM_NAMES: Set<&'static str> = phf_set! {
    "CA", "C4'", "C4*", "P",
};

static WATER_COMPONENT_NAMES: Set<&'static str> = phf_set! {
    "HOH", "WAT", "H2O", "DOD", "D2O", "SOL", "TIP3",
};

const DEFAULT_COVALENT_RADIUS: f64 = 1.5;
const DEFAULT_VDW_RADIUS: f64 = 2.0;

fn lookup<'a, T>(map: &'a Map<&'static str, T>, symbol: &str) -> Option<&'a T> {
    let symbol = symbol.trim();
    map.get(symbol)
        .or_else(|| map.get(symbol.to_ascii_uppercase().as_str()))
}

/// Covalent radius in Å for an element symbol, case-insensitive.
pub fn covalent_radius(symbol: &str) -> f64 {
    lookup(&COVALENT_RADII, symbol)
        .copied()
        .unwrap_or(DEFAULT_COVALENT_RADIUS)
}

/// Van der Waals radius in Å for an element symbol, case-insensitive.
pub fn vdw_radius(symbol: &str) -> f64 {
    lookup(&VDW_RADII, symbol)
        .copied()
        .unwrap_or(DEFAULT_VDW_RADIUS)
}

pub fn is_metal(symbol: &str) -> bool {
    let symbol = symbol.trim();
    METALS.contains(symbol) || METALS.contains(symbol.to_ascii_uppercase().as_str())
}

pub fn is_hydrogen(symbol: &str) -> bool {
    matches!(symbol.trim(), "H" | "D" | "h" | "d")
}

pub fn is_sulfur(symbol: &str) -> bool {
    matches!(symbol.trim(), "S" | "s")
}

/// Atom names that stand in for a whole residue in a polymer trace.
pub fn is_polymer_trace_atom(atom_name: &str) -> bool {
    POLYMER_TRACE_ATOM_NAMES.contains(atom_name.trim())
}

pub fn is_water_component(comp_id: &str) -> bool {
    WATER_COMPONENT_NAMES.contains(comp_id.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covalent_radius_is_case_insensitive() {
        assert_eq!(covalent_radius("C"), 0.76);
        assert_eq!(covalent_radius("Fe"), 1.32);
        assert_eq!(covalent_radius("fe"), 1.32);
        assert_eq!(covalent_radius(" N "), 0.71);
    }

    #[test]
    fn covalent_radius_falls_back_for_unknown_elements() {
        assert_eq!(covalent_radius("XX"), DEFAULT_COVALENT_RADIUS);
        assert_eq!(covalent_radius(""), DEFAULT_COVALENT_RADIUS);
    }

    #[test]
    fn vdw_radius_uses_table_or_default() {
        assert_eq!(vdw_radius("O"), 1.52);
        assert_eq!(vdw_radius("Zn"), 1.39);
        assert_eq!(vdw_radius("UNK"), DEFAULT_VDW_RADIUS);
    }

    #[test]
    fn metal_detection_recognizes_common_ions() {
        assert!(is_metal("ZN"));
        assert!(is_metal("Mg"));
        assert!(!is_metal("C"));
        assert!(!is_metal("S"));
    }

    #[test]
    fn element_predicates_match_symbols() {
        assert!(is_hydrogen("H"));
        assert!(is_hydrogen("D"));
        assert!(!is_hydrogen("HG"));
        assert!(is_sulfur("S"));
        assert!(!is_sulfur("SE"));
    }

    #[test]
    fn polymer_trace_atoms_cover_protein_and_nucleic_acid() {
        assert!(is_polymer_trace_atom("CA"));
        assert!(is_polymer_trace_atom("C4'"));
        assert!(is_polymer_trace_atom("P"));
        assert!(!is_polymer_trace_atom("CB"));
    }

    #[test]
    fn water_components_are_recognized() {
        assert!(is_water_component("HOH"));
        assert!(is_water_component("WAT"));
        assert!(!is_water_component("ALA"));
    }
}
