//! Stratagem catalog
//!
//! Loaded once at startup and shared read-only for the life of the process.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// One directional input symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "U", alias = "u")]
    Up,
    #[serde(alias = "D", alias = "d")]
    Down,
    #[serde(alias = "L", alias = "l")]
    Left,
    #[serde(alias = "R", alias = "r")]
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Unit vector in screen space (y grows downward)
    pub fn screen_vector(&self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    /// Accepts words and their initials
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" | "u" => Ok(Direction::Up),
            "down" | "d" => Ok(Direction::Down),
            "left" | "l" => Ok(Direction::Left),
            "right" | "r" => Ok(Direction::Right),
            other => Err(format!("unknown direction `{other}`")),
        }
    }
}

/// A named input sequence the player must reproduce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stratagem {
    pub id: u32,
    pub name: String,
    pub sequence: Vec<Direction>,
    /// Key handed to the asset loader for this stratagem's icon
    pub asset_key: String,
}

impl Stratagem {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

type Entry = (&'static str, &'static str, &'static [Direction]);

const BUILTIN: &[Entry] = {
    use Direction::{Down as D, Left as L, Right as R, Up as U};
    &[
        ("Reinforce", "reinforce", &[U, D, R, L, U]),
        ("Resupply", "resupply", &[D, D, U, R]),
        ("SOS Beacon", "sos_beacon", &[U, D, R, U]),
        ("Hellbomb", "hellbomb", &[D, U, L, D, U, R, D, U]),
        ("Eagle Strafing Run", "eagle_strafing_run", &[U, R, R]),
        ("Eagle Airstrike", "eagle_airstrike", &[U, R, D, R]),
        ("Eagle Cluster Bomb", "eagle_cluster_bomb", &[U, R, D, D, R]),
        ("Eagle Napalm Airstrike", "eagle_napalm_airstrike", &[U, R, D, U]),
        ("Eagle 110mm Rocket Pods", "eagle_rocket_pods", &[U, R, U, L]),
        ("Eagle 500kg Bomb", "eagle_500kg_bomb", &[U, R, D, D, D]),
        ("Orbital Precision Strike", "orbital_precision_strike", &[R, R, U]),
        ("Orbital Airburst Strike", "orbital_airburst_strike", &[R, R, R]),
        ("Orbital Gatling Barrage", "orbital_gatling_barrage", &[R, D, L, U, U]),
        ("Orbital 120mm HE Barrage", "orbital_120mm_barrage", &[R, R, D, L, R, D]),
        ("Orbital 380mm HE Barrage", "orbital_380mm_barrage", &[R, D, U, U, L, D, D]),
        ("Orbital Laser", "orbital_laser", &[R, D, U, R, D]),
        ("Orbital Railcannon Strike", "orbital_railcannon_strike", &[R, U, D, D, R]),
        ("Machine Gun", "machine_gun", &[D, L, D, U, R]),
        ("Anti-Materiel Rifle", "anti_materiel_rifle", &[D, L, R, U, D]),
        ("Expendable Anti-Tank", "expendable_anti_tank", &[D, D, L, U, R]),
        ("Recoilless Rifle", "recoilless_rifle", &[D, L, R, R, L]),
        ("Autocannon", "autocannon", &[D, L, D, U, U, R]),
        ("Shield Generator Pack", "shield_generator_pack", &[D, U, L, R, L, R]),
        ("Supply Pack", "supply_pack", &[D, L, D, U, U, D]),
        ("HMG Emplacement", "hmg_emplacement", &[D, U, L, R, R, L]),
        ("Tesla Tower", "tesla_tower", &[D, U, R, U, L, R]),
        ("Anti-Personnel Minefield", "anti_personnel_minefield", &[D, L, U, R]),
        ("Guard Dog", "guard_dog", &[D, U, L, U, R, D]),
    ]
};

/// Immutable, validated list of stratagems
#[derive(Debug, Clone)]
pub struct StratagemCatalog {
    stratagems: Vec<Stratagem>,
}

impl StratagemCatalog {
    /// Validate and wrap a list of stratagems
    pub fn new(stratagems: Vec<Stratagem>) -> Result<Self, CatalogError> {
        if stratagems.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::with_capacity(stratagems.len());
        for s in &stratagems {
            if s.is_empty() {
                return Err(CatalogError::EmptySequence {
                    id: s.id,
                    name: s.name.clone(),
                });
            }
            if !seen.insert(s.id) {
                return Err(CatalogError::DuplicateId(s.id));
            }
        }
        Ok(Self { stratagems })
    }

    /// The standard stratagem set
    pub fn builtin() -> Self {
        let stratagems = BUILTIN
            .iter()
            .zip(1u32..)
            .map(|(&(name, asset_key, sequence), id)| Stratagem {
                id,
                name: name.to_string(),
                sequence: sequence.to_vec(),
                asset_key: asset_key.to_string(),
            })
            .collect();
        Self { stratagems }
    }

    /// Parse a JSON array of stratagems
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let stratagems: Vec<Stratagem> = serde_json::from_str(json)?;
        Self::new(stratagems)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_json_str(&json)?;
        log::info!(
            "Loaded {} stratagems from {}",
            catalog.len(),
            path.as_ref().display()
        );
        Ok(catalog)
    }

    pub fn all(&self) -> &[Stratagem] {
        &self.stratagems
    }

    pub fn get(&self, index: usize) -> Option<&Stratagem> {
        self.stratagems.get(index)
    }

    pub fn by_id(&self, id: u32) -> Option<&Stratagem> {
        self.stratagems.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.stratagems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stratagems.is_empty()
    }

    /// Pick a random index, avoiding the indices in `recent`.
    ///
    /// Falls back to the whole catalog when `recent` covers every entry.
    pub fn next_index<R: Rng + ?Sized>(&self, rng: &mut R, recent: &[usize]) -> usize {
        let candidates: Vec<usize> = (0..self.stratagems.len())
            .filter(|i| !recent.contains(i))
            .collect();
        if candidates.is_empty() {
            rng.random_range(0..self.stratagems.len())
        } else {
            candidates[rng.random_range(0..candidates.len())]
        }
    }

    pub fn next<R: Rng + ?Sized>(&self, rng: &mut R, recent: &[usize]) -> &Stratagem {
        &self.stratagems[self.next_index(rng, recent)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn stratagem(id: u32, sequence: Vec<Direction>) -> Stratagem {
        Stratagem {
            id,
            name: format!("S{id}"),
            sequence,
            asset_key: format!("s{id}"),
        }
    }

    #[test]
    fn test_builtin_is_valid() {
        let builtin = StratagemCatalog::builtin();
        let revalidated = StratagemCatalog::new(builtin.all().to_vec()).unwrap();
        assert_eq!(revalidated.len(), builtin.len());
        assert!(builtin.by_id(1).is_some_and(|s| s.name == "Reinforce"));
    }

    #[test]
    fn test_rejects_bad_catalogs() {
        assert!(matches!(
            StratagemCatalog::new(Vec::new()),
            Err(CatalogError::Empty)
        ));
        assert!(matches!(
            StratagemCatalog::new(vec![stratagem(1, vec![])]),
            Err(CatalogError::EmptySequence { id: 1, .. })
        ));
        assert!(matches!(
            StratagemCatalog::new(vec![
                stratagem(3, vec![Direction::Up]),
                stratagem(3, vec![Direction::Down]),
            ]),
            Err(CatalogError::DuplicateId(3))
        ));
    }

    #[test]
    fn test_from_json_accepts_words_and_letters() {
        let json = r#"[
            {"id": 7, "name": "Resupply", "sequence": ["down", "D", "up", "right"], "asset_key": "resupply"}
        ]"#;
        let catalog = StratagemCatalog::from_json_str(json).unwrap();
        assert_eq!(
            catalog.all()[0].sequence,
            vec![
                Direction::Down,
                Direction::Down,
                Direction::Up,
                Direction::Right
            ]
        );
    }

    #[test]
    fn test_next_avoids_recent() {
        let catalog = StratagemCatalog::new(vec![
            stratagem(1, vec![Direction::Up]),
            stratagem(2, vec![Direction::Down]),
            stratagem(3, vec![Direction::Left]),
        ])
        .unwrap();
        let mut rng = Pcg32::seed_from_u64(42);
        for _ in 0..200 {
            let idx = catalog.next_index(&mut rng, &[0, 2]);
            assert_eq!(idx, 1);
        }
    }

    #[test]
    fn test_next_falls_back_when_everything_is_recent() {
        let catalog = StratagemCatalog::new(vec![stratagem(1, vec![Direction::Up])]).unwrap();
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(catalog.next(&mut rng, &[0]).id, 1);
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("U".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!(" left ".parse::<Direction>(), Ok(Direction::Left));
        assert_eq!("r".parse::<Direction>(), Ok(Direction::Right));
        assert!("north".parse::<Direction>().is_err());
    }
}
