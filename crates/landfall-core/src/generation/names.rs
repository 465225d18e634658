//! Name generation utilities

use rand::seq::SliceRandom;
use rand::Rng;

/// A character name: given name plus an epithet.
pub fn generate_name(rng: &mut impl Rng) -> String {
    let given = GIVEN_NAMES.choose(rng).copied().unwrap_or("Ash");
    let epithet = EPITHETS.choose(rng).copied().unwrap_or("the Quiet");
    format!("{given} {epithet}")
}

/// A place name for a root location.
pub fn generate_place_name(rng: &mut impl Rng) -> String {
    let prefix = PLACE_PREFIXES.choose(rng).copied().unwrap_or("Stone");
    let suffix = PLACE_SUFFIXES.choose(rng).copied().unwrap_or("ford");
    format!("{prefix}{suffix}")
}

static GIVEN_NAMES: &[&str] = &[
    "Ada", "Bran", "Cora", "Dunstan", "Edda", "Finn", "Gwen", "Hal", "Ilse", "Jory", "Kestrel",
    "Lorn", "Maren", "Nils", "Oona", "Piet", "Quill", "Rowan", "Sela", "Tobin", "Ulla", "Vesna",
    "Wren", "Yorick",
];

static EPITHETS: &[&str] = &[
    "of the Marsh",
    "the Tall",
    "Ironhand",
    "the Younger",
    "Greycloak",
    "of the Ford",
    "Quickstep",
    "the Patient",
    "Ashborn",
    "Longbow",
    "the Quiet",
    "Saltwater",
];

static PLACE_PREFIXES: &[&str] = &[
    "Ash", "Black", "Bram", "Cold", "Elder", "Fen", "Green", "High", "Mill", "Oak", "Red", "Stone",
    "Thorn", "Wester", "Wolf",
];

static PLACE_SUFFIXES: &[&str] = &[
    "ford", "stead", "wick", "holm", "by", "mere", "dale", "cross", "hollow", "gate",
];
