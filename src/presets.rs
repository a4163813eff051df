use super::*;
use lazy_static::lazy_static;

/// Keywords whose presence in a token suggests an amine-containing fragment.
pub const AMINE_INDICATORS: &[&str] = &[
    "piperaz", "benzidin", "eniminium", "adeninium", "lidinium", "linium", "naphthyridin",
    "phenanthrolin", "piperid", "guanid", "amin", "ammon", "ine", "ammin", "az", "pyrimid", "nitrilo",
    "phyrin", "pyrrol", "isoindole", "anil", "ptilocaulin", "phycene", "annulene", "metformin", "pyrid",
];

/// Element and cation names that would otherwise be mistaken for amine tokens
/// (e.g. "Gismondine" matches "ine").
pub const METAL_INDICATORS: &[&str] = &[
    "Actinium", "Aluminium", "Americium", "Barium", "Berkelium", "Beryllium", "Bismuth", "Bohrium", "Cadmium",
    "Calcium", "Californium", "Cerium", "Cesium", "Chromium", "Cobalt", "Copper", "Curium", "Darmstadtium", "Dubnium",
    "Dysprosium", "Einsteinium", "Erbium", "Europium", "Fermium", "Francium", "Gadolinium", "Gallium", "Germanium",
    "Gismondine", "Gold", "Hafnium", "Hassium", "Holmium", "Hydronium", "Hydroxonium", "Indium", "Iridium", "Iron",
    "Lanthanum", "Lawrencium", "Lead", "Lithium", "Lutetium", "Magnesium", "Manganese", "Meitnerium", "Mendelevium",
    "Mercury", "Molybdenum", "Neodymium", "Neptunium", "Nickel", "Niobium", "Nobelium", "Osmium", "Oxonium",
    "Palladium", "Platinum", "Plutonium", "Polonium", "Potassium", "Praseodymium", "Promethium", "Protactinium",
    "Radium", "Rhenium", "Rhodium", "Roentgenium", "Rubidium", "Ruthenium", "Rutherfordium", "Samarium", "Scandium",
    "Seaborgium", "Silver", "Sodium", "Strontium", "Tantalum", "Technetium", "Tellurium", "Terbium", "Thallium",
    "Thorium", "Thulium", "Tin", "Titanium", "Tungsten", "Ununbium", "Ununhexium", "Ununpentium", "Ununquadium",
    "Ununtrium", "Uranium", "Vanadium", "Ytterbium", "Yttrium", "Zinc", "Zirconium",
];

lazy_static! {
    /// Known spelling and encoding defects of CSD chemical names.
    pub static ref CSD_SUBSTITUTIONS: SubstitutionRules =
        SubstitutionRules::from_csv_reader(include_str!("csdsub.csv").as_bytes())
            .expect("built-in substitution table is valid CSV");
}

/// Amine finder over CSD names: amine keywords, metal exclusions, CSD substitutions.
pub fn amine_finder_config() -> FinderConfig {
    FinderConfig::new("AmineFinder", AMINE_INDICATORS.iter().copied())
        .with_exclusions(METAL_INDICATORS.iter().copied())
        .with_rules(CSD_SUBSTITUTIONS.clone())
}
