//! Analysis Prompt Builder
//!
//! Turns a chart payload (plus optional partner chart) and a tier into the
//! natural-language request sent to the completion model. Each tier carries
//! its own fixed section outline; the outline is the per-tier content
//! contract, shared with the mock reports and asserted by tests.

use crate::error::{ReadingError, Result};
use crate::model::{ChartPayload, Tier};

/// System prompt sent ahead of every analysis request
pub const SYSTEM_PROMPT: &str = "You are an expert astrologer with deep knowledge of Western \
astrology, planetary influences, and psychological astrology. Provide insightful, personalized \
interpretations that are both accurate and meaningful. Focus on practical insights that can help \
the person understand themselves better.";

/// One required section of a reading
#[derive(Clone, Copy, Debug)]
pub struct SectionSpec {
    pub title: &'static str,
    pub guidance: &'static str,
}

/// Basic tier: essential, immediately practical insights
pub const BASIC_SECTIONS: [SectionSpec; 4] = [
    SectionSpec {
        title: "Core Personality",
        guidance: "2-3 paragraphs: main character traits from Sun, Moon, and Ascendant; how they \
naturally express themselves; key personality strengths",
    },
    SectionSpec {
        title: "Life Purpose",
        guidance: "1-2 paragraphs: main life lessons and soul mission; what they're here to learn \
and share; simple guidance for direction",
    },
    SectionSpec {
        title: "Relationships & Career",
        guidance: "2-3 paragraphs: basic relationship patterns and needs; career inclinations and \
work style; simple advice for improvement",
    },
    SectionSpec {
        title: "Current Growth",
        guidance: "1-2 paragraphs: what they're learning now; 3-5 practical tips for personal \
development; encouragement and positive reinforcement",
    },
];

/// Detailed tier: a complete life blueprint
pub const DETAILED_SECTIONS: [SectionSpec; 10] = [
    SectionSpec {
        title: "Complete Personality Profile",
        guidance: "4-5 paragraphs: exhaustive personality analysis using all planets; \
psychological archetypes, cognitive processes, emotional intelligence",
    },
    SectionSpec {
        title: "Soul Mission & Karmic Patterns",
        guidance: "3-4 paragraphs: deep soul lessons, karmic contracts, evolutionary purpose, \
spiritual gifts",
    },
    SectionSpec {
        title: "Relationship Blueprint",
        guidance: "4-5 paragraphs: complete relationship patterns and needs; family dynamics; how \
they give and receive love; relationship timing",
    },
    SectionSpec {
        title: "Career & Life Purpose",
        guidance: "4-5 paragraphs: complete career analysis; professional strengths; financial \
patterns; life purpose alignment",
    },
    SectionSpec {
        title: "Complete House Analysis",
        guidance: "3-4 paragraphs: house-by-house interpretation; life areas of focus; how houses \
interact",
    },
    SectionSpec {
        title: "Advanced Aspect Analysis",
        guidance: "3-4 paragraphs: all major aspects and their meanings; aspect patterns; how to \
work with challenging aspects",
    },
    SectionSpec {
        title: "Life Cycles & Timing",
        guidance: "3-4 paragraphs: current life phase; major transitions; Saturn returns and \
other important cycles; when to make important decisions",
    },
    SectionSpec {
        title: "Shadow Work & Healing",
        guidance: "3-4 paragraphs: shadow patterns and unconscious blocks; healing opportunities; \
self-sabotage patterns and how to overcome them",
    },
    SectionSpec {
        title: "Practical Application",
        guidance: "4-5 paragraphs: 15-20 specific, actionable recommendations; daily practices; \
long-term growth strategy",
    },
    SectionSpec {
        title: "Future Guidance",
        guidance: "2-3 paragraphs: upcoming opportunities and challenges; long-term vision and \
goals alignment",
    },
];

/// Comprehensive tier: master-level synastry for two charts
pub const COMPREHENSIVE_SECTIONS: [SectionSpec; 11] = [
    SectionSpec {
        title: "Overall Compatibility Assessment",
        guidance: "3-4 paragraphs: overall relationship potential; key strengths and challenges; \
karmic connection",
    },
    SectionSpec {
        title: "Communication & Mental Connection",
        guidance: "3-4 paragraphs: Mercury-Mercury aspects and communication styles; intellectual \
compatibility; potential communication challenges and solutions",
    },
    SectionSpec {
        title: "Emotional & Intimate Connection",
        guidance: "3-4 paragraphs: Venus-Mars aspects and romantic attraction; Moon aspects and \
emotional compatibility; how they support each other",
    },
    SectionSpec {
        title: "Power Dynamics & Life Goals",
        guidance: "3-4 paragraphs: Sun-Sun aspects and core identity compatibility; leadership \
roles; shared life goals",
    },
    SectionSpec {
        title: "Practical & Daily Life",
        guidance: "3-4 paragraphs: Saturn aspects and commitment potential; daily routines; \
financial and material security",
    },
    SectionSpec {
        title: "Spiritual & Growth Connection",
        guidance: "3-4 paragraphs: Neptune and spiritual connection; Jupiter aspects and growth \
opportunities; how they help each other evolve",
    },
    SectionSpec {
        title: "Challenges & Growth Areas",
        guidance: "3-4 paragraphs: Mars aspects and potential conflicts; Saturn lessons; Pluto \
transformation areas; working through difficulties together",
    },
    SectionSpec {
        title: "Harmonious Aspects & Strengths",
        guidance: "3-4 paragraphs: trines and sextiles for natural harmony; conjunctions for \
strong connections; shared talents",
    },
    SectionSpec {
        title: "Timing & Relationship Phases",
        guidance: "3-4 paragraphs: current relationship phase; important milestones; when to make \
major decisions",
    },
    SectionSpec {
        title: "Practical Recommendations",
        guidance: "4-5 paragraphs: 15-20 specific recommendations; communication strategies; \
conflict resolution approaches; activities for growth together",
    },
    SectionSpec {
        title: "Future Potential & Guidance",
        guidance: "2-3 paragraphs: long-term potential; upcoming challenges and opportunities; \
vision for the future together",
    },
];

/// The required section outline for a tier
pub fn sections_for(tier: Tier) -> &'static [SectionSpec] {
    match tier {
        Tier::Basic => &BASIC_SECTIONS,
        Tier::Detailed => &DETAILED_SECTIONS,
        Tier::Comprehensive => &COMPREHENSIVE_SECTIONS,
    }
}

/// Build the full analysis prompt for a tier.
///
/// `comprehensive` requires a partner chart; the other tiers ignore it.
pub fn build_prompt(
    chart: &ChartPayload,
    partner: Option<&ChartPayload>,
    tier: Tier,
) -> Result<String> {
    let mut prompt = chart_info(chart, None);

    let header = match tier {
        Tier::Basic => {
            "You are an expert astrologer providing a BASIC astrological reading. Focus on \
essential insights that are immediately practical and actionable.\n\nPlease provide a concise, \
beginner-friendly analysis covering:"
        }
        Tier::Detailed => {
            "You are an expert astrologer providing a DETAILED astrological reading. This is a \
comprehensive analysis that goes deeper into psychological patterns and life themes.\n\nPlease \
provide an in-depth analysis covering:"
        }
        Tier::Comprehensive => {
            let partner = partner.ok_or(ReadingError::MissingPartnerData)?;
            prompt.push_str("\n\n");
            prompt.push_str(&chart_info(partner, Some("Partner ")));

            "You are a master astrologer providing a COMPREHENSIVE RELATIONSHIP COMPATIBILITY \
ANALYSIS (Synastry). This is the most detailed relationship analysis possible, covering every \
aspect of their astrological compatibility.\n\nPlease provide a complete, master-level \
relationship analysis covering:"
        }
    };

    prompt.push_str("\n\n");
    prompt.push_str(header);
    prompt.push('\n');

    for (i, section) in sections_for(tier).iter().enumerate() {
        prompt.push_str(&format!(
            "\n{}. **{}**\n   - {}\n",
            i + 1,
            section.title,
            section.guidance
        ));
    }

    let closing = match tier {
        Tier::Basic => {
            "\nKeep the tone warm, encouraging, and easy to understand. Focus on practical \
insights that can be applied immediately. Use simple language and avoid complex astrological \
jargon."
        }
        Tier::Detailed => {
            "\nUse advanced astrological concepts while maintaining clarity. Include \
psychological depth, spiritual insights, and practical wisdom. This should be a complete life \
blueprint that they can reference for years to come."
        }
        Tier::Comprehensive => {
            "\nUse advanced astrological synastry concepts while maintaining clarity. Include \
psychological insights, practical relationship advice, and spiritual wisdom. This should be a \
comprehensive relationship guide that they can reference throughout their journey together."
        }
    };
    prompt.push_str(closing);

    Ok(prompt)
}

/// Format one chart as the plain-language bullet block the model receives
fn chart_info(chart: &ChartPayload, prefix: Option<&str>) -> String {
    let prefix = prefix.unwrap_or("");
    let birth = &chart.birth_data;

    let mut info = format!(
        "{prefix}Birth Chart Data:\n- Date: {}\n- Time: {}\n- Location: {}\n- Age: {} years\n",
        birth.date, birth.time, birth.location, birth.age_years()
    );

    info.push_str(&format!("\n{prefix}Key Planetary Positions:\n"));
    for (planet, position) in &chart.planetary_positions {
        info.push_str(&format!(
            "- {}: {} {}° (House {})\n",
            planet, position.sign, position.degree, position.house
        ));
    }

    info.push_str(&format!("\n{prefix}Important Aspects:\n"));
    for aspect in &chart.aspects {
        info.push_str(&format!(
            "- {} {} {} ({}° orb)\n",
            aspect.planet1, aspect.aspect_type, aspect.planet2, aspect.orb
        ));
    }

    info.push_str(&format!("\n{prefix}Houses:\n"));
    for cusp in &chart.houses {
        info.push_str(&format!(
            "- House {}: {} {}°\n",
            cusp.house, cusp.sign, cusp.degree
        ));
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartGenerator;
    use crate::model::BirthSubject;
    use chrono::NaiveDate;

    fn chart() -> ChartPayload {
        let subject = BirthSubject {
            name: "Jane Doe".into(),
            date: NaiveDate::from_ymd_opt(1990, 5, 15).unwrap(),
            time: "12:00".into(),
            latitude: 42.6977,
            longitude: 23.3219,
            location: "Sofia, Bulgaria".into(),
        };
        ChartGenerator::with_table().generate(&subject)
    }

    #[test]
    fn test_comprehensive_requires_partner() {
        let err = build_prompt(&chart(), None, Tier::Comprehensive).unwrap_err();
        assert!(matches!(err, ReadingError::MissingPartnerData));

        let partner = chart();
        assert!(build_prompt(&chart(), Some(&partner), Tier::Comprehensive).is_ok());
    }

    #[test]
    fn test_lower_tiers_ignore_partner() {
        assert!(build_prompt(&chart(), None, Tier::Basic).is_ok());
        assert!(build_prompt(&chart(), None, Tier::Detailed).is_ok());
    }

    #[test]
    fn test_prompt_contains_all_sections() {
        let prompt = build_prompt(&chart(), None, Tier::Detailed).unwrap();
        for section in &DETAILED_SECTIONS {
            assert!(prompt.contains(section.title), "missing {}", section.title);
        }
    }

    #[test]
    fn test_prompt_contains_chart_data() {
        let prompt = build_prompt(&chart(), None, Tier::Basic).unwrap();
        assert!(prompt.contains("Sofia, Bulgaria"));
        assert!(prompt.contains("- Sun: Aries 15° (House 1)"));
        assert!(prompt.contains("Sun Conjunction Moon (7° orb)"));
    }

    #[test]
    fn test_comprehensive_prompt_carries_both_charts() {
        let partner = chart();
        let prompt = build_prompt(&chart(), Some(&partner), Tier::Comprehensive).unwrap();
        assert!(prompt.contains("Partner Birth Chart Data:"));
        assert!(prompt.contains("Synastry"));
    }

    #[test]
    fn test_outline_lengths() {
        assert_eq!(sections_for(Tier::Basic).len(), 4);
        assert_eq!(sections_for(Tier::Detailed).len(), 10);
        assert_eq!(sections_for(Tier::Comprehensive).len(), 11);
    }
}
