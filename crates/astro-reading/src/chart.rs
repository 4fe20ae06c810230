//! Birth Chart Generation
//!
//! Produces the fixed-shape chart payload the analysis pipeline consumes:
//! ten planetary placements, twelve houses, a short aspect list.
//!
//! Real astronomical calculation is an external concern behind the
//! [`Ephemeris`] trait; the shipped [`TableEphemeris`] returns a fixed
//! placement table (a stand-in, not an ephemeris engine). Swapping in a real
//! ephemeris is a matter of implementing the trait.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;

use crate::model::{
    Aspect, AspectType, BirthSubject, ChartPayload, HouseCusp, Planet, PlanetPosition, ZodiacSign,
};

/// Source of planetary placements and aspects for a birth subject
pub trait Ephemeris: Send + Sync {
    /// Placement for each of the ten bodies
    fn positions(&self, subject: &BirthSubject) -> BTreeMap<Planet, PlanetPosition>;

    /// Major aspects between bodies
    fn aspects(&self, subject: &BirthSubject) -> Vec<Aspect>;
}

/// Fixed placement table. Identical output for every input; a documented
/// stand-in for a real ephemeris.
#[derive(Clone, Copy, Debug, Default)]
pub struct TableEphemeris;

impl TableEphemeris {
    const TABLE: [(Planet, ZodiacSign, u8, u8); 10] = [
        (Planet::Sun, ZodiacSign::Aries, 15, 1),
        (Planet::Moon, ZodiacSign::Cancer, 22, 4),
        (Planet::Mercury, ZodiacSign::Aries, 8, 1),
        (Planet::Venus, ZodiacSign::Pisces, 28, 12),
        (Planet::Mars, ZodiacSign::Taurus, 5, 2),
        (Planet::Jupiter, ZodiacSign::Sagittarius, 12, 9),
        (Planet::Saturn, ZodiacSign::Capricorn, 18, 10),
        (Planet::Uranus, ZodiacSign::Aquarius, 3, 11),
        (Planet::Neptune, ZodiacSign::Pisces, 25, 12),
        (Planet::Pluto, ZodiacSign::Capricorn, 29, 10),
    ];
}

impl Ephemeris for TableEphemeris {
    fn positions(&self, _subject: &BirthSubject) -> BTreeMap<Planet, PlanetPosition> {
        Self::TABLE
            .iter()
            .map(|&(planet, sign, degree, house)| {
                (planet, PlanetPosition { sign, degree, house })
            })
            .collect()
    }

    fn aspects(&self, _subject: &BirthSubject) -> Vec<Aspect> {
        vec![
            Aspect {
                planet1: Planet::Sun,
                planet2: Planet::Moon,
                aspect_type: AspectType::Conjunction,
                orb: 7,
            },
            Aspect {
                planet1: Planet::Venus,
                planet2: Planet::Mars,
                aspect_type: AspectType::Trine,
                orb: 3,
            },
            Aspect {
                planet1: Planet::Jupiter,
                planet2: Planet::Saturn,
                aspect_type: AspectType::Square,
                orb: 5,
            },
        ]
    }
}

/// Generates chart payloads for validated birth subjects. Infallible: every
/// structurally valid subject yields a complete chart.
#[derive(Clone)]
pub struct ChartGenerator {
    ephemeris: Arc<dyn Ephemeris>,
}

impl ChartGenerator {
    pub fn new(ephemeris: Arc<dyn Ephemeris>) -> Self {
        Self { ephemeris }
    }

    /// Generator backed by the fixed placement table
    pub fn with_table() -> Self {
        Self::new(Arc::new(TableEphemeris))
    }

    /// Build the full chart payload for one subject
    pub fn generate(&self, subject: &BirthSubject) -> ChartPayload {
        let mut rng = rand::thread_rng();

        // 12 houses, zodiac order; cusp degrees vary per call
        let houses = ZodiacSign::ALL
            .iter()
            .enumerate()
            .map(|(i, &sign)| HouseCusp {
                house: (i + 1) as u8,
                sign,
                degree: rng.gen_range(0..30),
            })
            .collect();

        ChartPayload {
            id: format!("chart_{}", Utc::now().timestamp_millis()),
            birth_data: subject.clone(),
            planetary_positions: self.ephemeris.positions(subject),
            houses,
            aspects: self.ephemeris.aspects(subject),
            calculated_at: Utc::now(),
        }
    }
}

impl Default for ChartGenerator {
    fn default() -> Self {
        Self::with_table()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn subject() -> BirthSubject {
        BirthSubject {
            name: "Jane Doe".into(),
            date: NaiveDate::from_ymd_opt(1990, 5, 15).unwrap(),
            time: "12:00".into(),
            latitude: 42.6977,
            longitude: 23.3219,
            location: "Sofia, Bulgaria".into(),
        }
    }

    #[test]
    fn test_chart_has_ten_planets() {
        let chart = ChartGenerator::with_table().generate(&subject());
        assert_eq!(chart.planetary_positions.len(), 10);
        for planet in Planet::ALL {
            assert!(chart.planetary_positions.contains_key(&planet));
        }
    }

    #[test]
    fn test_chart_has_twelve_ordered_houses() {
        let chart = ChartGenerator::with_table().generate(&subject());
        assert_eq!(chart.houses.len(), 12);
        for (i, cusp) in chart.houses.iter().enumerate() {
            assert_eq!(cusp.house, (i + 1) as u8);
            assert!(cusp.degree < 30);
        }
    }

    #[test]
    fn test_positions_within_bounds() {
        let chart = ChartGenerator::with_table().generate(&subject());
        for position in chart.planetary_positions.values() {
            assert!(position.degree < 30);
            assert!((1..=12).contains(&position.house));
        }
    }

    #[test]
    fn test_chart_id_shape() {
        let chart = ChartGenerator::with_table().generate(&subject());
        assert!(chart.id.starts_with("chart_"));
    }
}
