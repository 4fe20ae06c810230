//! Domain Models
//!
//! Core data types for birth charts and AI readings. Everything here is
//! owned by a single user flow and never mutated after creation.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ReadingError, Result};

/// The ten classical and modern bodies every chart carries
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Planet {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl Planet {
    pub const ALL: [Planet; 10] = [
        Planet::Sun,
        Planet::Moon,
        Planet::Mercury,
        Planet::Venus,
        Planet::Mars,
        Planet::Jupiter,
        Planet::Saturn,
        Planet::Uranus,
        Planet::Neptune,
        Planet::Pluto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Planet::Sun => "Sun",
            Planet::Moon => "Moon",
            Planet::Mercury => "Mercury",
            Planet::Venus => "Venus",
            Planet::Mars => "Mars",
            Planet::Jupiter => "Jupiter",
            Planet::Saturn => "Saturn",
            Planet::Uranus => "Uranus",
            Planet::Neptune => "Neptune",
            Planet::Pluto => "Pluto",
        }
    }
}

impl std::fmt::Display for Planet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The twelve zodiac signs, in wheel order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ZodiacSign::Aries => "Aries",
            ZodiacSign::Taurus => "Taurus",
            ZodiacSign::Gemini => "Gemini",
            ZodiacSign::Cancer => "Cancer",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Virgo",
            ZodiacSign::Libra => "Libra",
            ZodiacSign::Scorpio => "Scorpio",
            ZodiacSign::Sagittarius => "Sagittarius",
            ZodiacSign::Capricorn => "Capricorn",
            ZodiacSign::Aquarius => "Aquarius",
            ZodiacSign::Pisces => "Pisces",
        }
    }
}

impl std::fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Major aspect types between two bodies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectType {
    Conjunction,
    Sextile,
    Square,
    Trine,
    Opposition,
}

impl AspectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectType::Conjunction => "Conjunction",
            AspectType::Sextile => "Sextile",
            AspectType::Square => "Square",
            AspectType::Trine => "Trine",
            AspectType::Opposition => "Opposition",
        }
    }
}

impl std::fmt::Display for AspectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A planet's placement in a chart
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PlanetPosition {
    pub sign: ZodiacSign,
    /// Degree within the sign, [0, 30)
    pub degree: u8,
    /// House number, 1..=12
    pub house: u8,
}

/// A house cusp
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct HouseCusp {
    /// House number, 1..=12
    pub house: u8,
    pub sign: ZodiacSign,
    /// Cusp degree within the sign, [0, 30)
    pub degree: u8,
}

/// An aspect between two bodies
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Aspect {
    pub planet1: Planet,
    pub planet2: Planet,
    #[serde(rename = "type")]
    pub aspect_type: AspectType,
    /// Orb in degrees
    pub orb: u8,
}

/// Birth details for one person, validated at the form boundary and
/// immutable afterward.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BirthSubject {
    #[serde(default = "default_subject_name")]
    pub name: String,

    /// Birth date (calendar date; time of day lives in `time`)
    pub date: NaiveDate,

    /// Birth time, "HH:MM" 24-hour
    pub time: String,

    pub latitude: f64,
    pub longitude: f64,

    /// Free-text birth place, e.g. "Sofia, Bulgaria"
    pub location: String,
}

fn default_subject_name() -> String {
    "User".into()
}

impl BirthSubject {
    /// Strip the obvious injection vectors from free-text input
    pub fn sanitize(input: &str) -> String {
        input
            .trim()
            .replace(['<', '>'], "")
            .replace("javascript:", "")
            .replace("Javascript:", "")
    }

    /// Validate every field, reporting the first offending one.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.len() > 100 {
            return Err(ReadingError::validation(
                "name",
                "must be between 1 and 100 characters",
            ));
        }
        if !self
            .name
            .chars()
            .all(|c| c.is_alphabetic() || c.is_whitespace() || matches!(c, '-' | '\'' | '.'))
        {
            return Err(ReadingError::validation(
                "name",
                "can only contain letters, spaces, hyphens, apostrophes, and periods",
            ));
        }

        let min_date = NaiveDate::from_ymd_opt(1900, 1, 1).expect("valid constant date");
        let today = Utc::now().date_naive();
        if self.date < min_date || self.date > today {
            return Err(ReadingError::validation(
                "birthDate",
                "must be between 1900 and today",
            ));
        }

        if !is_valid_time(&self.time) {
            return Err(ReadingError::validation(
                "birthTime",
                "must be in HH:MM format (24-hour)",
            ));
        }

        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ReadingError::validation(
                "latitude",
                "must be between -90 and 90",
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ReadingError::validation(
                "longitude",
                "must be between -180 and 180",
            ));
        }

        if self.location.is_empty() || self.location.len() > 200 {
            return Err(ReadingError::validation(
                "location",
                "must be between 1 and 200 characters",
            ));
        }
        if !self.location.chars().all(|c| {
            c.is_alphabetic() || c.is_whitespace() || matches!(c, '-' | '\'' | '.' | ',' | '(' | ')')
        }) {
            return Err(ReadingError::validation(
                "location",
                "contains unsupported characters",
            ));
        }

        Ok(())
    }

    /// Age in years, by calendar year difference
    pub fn age_years(&self) -> i32 {
        Utc::now().year() - self.date.year()
    }
}

/// Parse the two birth-date shapes the wire sends: a full RFC 3339 datetime
/// or a bare `YYYY-MM-DD`.
pub fn parse_birth_date(raw: &str) -> Result<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ReadingError::validation("birthDate", "must be an ISO date"))
}

fn is_valid_time(time: &str) -> bool {
    let Some((hours, minutes)) = time.split_once(':') else {
        return false;
    };
    let (Ok(h), Ok(m)) = (hours.parse::<u8>(), minutes.parse::<u8>()) else {
        return false;
    };
    !hours.is_empty() && hours.len() <= 2 && minutes.len() == 2 && h < 24 && m < 60
}

/// A fully computed birth chart. Read-only after generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPayload {
    /// Opaque, time-derived id (e.g. "chart_1700000000000")
    pub id: String,

    pub birth_data: BirthSubject,

    /// Always exactly the ten bodies in [`Planet::ALL`]
    pub planetary_positions: BTreeMap<Planet, PlanetPosition>,

    /// Always exactly 12 entries, numbered 1..=12 in order
    pub houses: Vec<HouseCusp>,

    pub aspects: Vec<Aspect>,

    pub calculated_at: DateTime<Utc>,
}

impl ChartPayload {
    /// Placement of one body, if present
    pub fn position(&self, planet: Planet) -> Option<&PlanetPosition> {
        self.planetary_positions.get(&planet)
    }

    /// Sign name of one body, falling back to a generic label
    pub fn sign_of(&self, planet: Planet) -> &str {
        self.position(planet)
            .map_or("their sign", |p| p.sign.as_str())
    }
}

/// Purchasable analysis depths
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    Detailed,
    Comprehensive,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Basic => "basic",
            Tier::Detailed => "detailed",
            Tier::Comprehensive => "comprehensive",
        }
    }

    /// Tier purchased by a catalog plan
    pub fn from_plan(plan: astro_payments::Plan) -> Self {
        match plan {
            astro_payments::Plan::Basic => Tier::Basic,
            astro_payments::Plan::Detailed => Tier::Detailed,
            astro_payments::Plan::Comprehensive => Tier::Comprehensive,
        }
    }

    /// Whether this tier needs a second (partner) chart
    pub fn requires_partner(&self) -> bool {
        matches!(self, Tier::Comprehensive)
    }

    /// Capitalized display name, e.g. "Basic"
    pub fn display(&self) -> &'static str {
        match self {
            Tier::Basic => "Basic",
            Tier::Detailed => "Detailed",
            Tier::Comprehensive => "Comprehensive",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A generated reading. Created once per checkout, never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Opaque, time-derived id (e.g. "analysis_1700000000000")
    pub id: String,

    /// Advisory pointer to the chart this was generated from; not a foreign
    /// key into any store
    pub birth_chart_id: String,

    pub analysis_type: Tier,

    /// The reading text, markdown-ish
    pub content: String,

    pub generated_at: DateTime<Utc>,

    /// Model that produced the content (mock models carry a "-mock-" tag)
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,

    /// Estimated provider cost in USD, 2 decimal places
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<Decimal>,
}

/// Everything the birth form produced, persisted as one unit
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthBundle {
    pub subject: BirthSubject,
    pub chart: ChartPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner: Option<PartnerBundle>,
}

/// Partner half of a comprehensive reading
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerBundle {
    pub subject: BirthSubject,
    pub chart: ChartPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_valid_subject_passes() {
        assert!(subject().validate().is_ok());
    }

    #[test]
    fn test_name_charset_rejected() {
        let mut s = subject();
        s.name = "Jane <script>".into();
        assert!(matches!(
            s.validate(),
            Err(ReadingError::Validation { field, .. }) if field == "name"
        ));
    }

    #[test]
    fn test_time_format() {
        let mut s = subject();
        s.time = "25:00".into();
        assert!(s.validate().is_err());
        s.time = "7:30".into();
        assert!(s.validate().is_ok());
        s.time = "07:3".into();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_latitude_range() {
        let mut s = subject();
        s.latitude = 91.0;
        assert!(matches!(
            s.validate(),
            Err(ReadingError::Validation { field, .. }) if field == "latitude"
        ));
    }

    #[test]
    fn test_date_range() {
        let mut s = subject();
        s.date = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_sanitize_strips_markup() {
        assert_eq!(BirthSubject::sanitize("  Jane <b>Doe</b> "), "Jane bDoe/b");
        assert_eq!(BirthSubject::sanitize("javascript:alert(1)"), "alert(1)");
    }

    #[test]
    fn test_parse_birth_date_shapes() {
        assert_eq!(
            parse_birth_date("1990-05-15").unwrap(),
            NaiveDate::from_ymd_opt(1990, 5, 15).unwrap()
        );
        assert_eq!(
            parse_birth_date("1990-05-15T00:00:00Z").unwrap(),
            NaiveDate::from_ymd_opt(1990, 5, 15).unwrap()
        );
        assert!(parse_birth_date("May 15 1990").is_err());
    }

    #[test]
    fn test_tier_from_plan() {
        assert_eq!(Tier::from_plan(astro_payments::Plan::Basic), Tier::Basic);
        assert!(Tier::from_plan(astro_payments::Plan::Comprehensive).requires_partner());
        assert!(!Tier::Detailed.requires_partner());
    }
}
