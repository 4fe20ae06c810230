//! Canned Mock Reports
//!
//! Tier-specific reading text returned when no completion credentials are
//! configured (demo mode). Each report carries every section of its tier's
//! outline from [`crate::prompt`], interpolating the chart's placements so
//! the demo output still reflects the submitted data.

use crate::model::{ChartPayload, Planet, Tier};
use crate::prompt::sections_for;

/// Model tag recorded on mock results, e.g. "gpt-4-mock-basic"
pub fn mock_model(tier: Tier) -> String {
    format!("gpt-4-mock-{}", tier.as_str())
}

/// Build the canned report for a tier
pub fn mock_report(chart: &ChartPayload, partner: Option<&ChartPayload>, tier: Tier) -> String {
    let birth = &chart.birth_data;
    let mut content = format!(
        "🌟 **AI Astrological Analysis - {} Reading**\n\n**Birth Details:** {} at {} in {}\n",
        tier.display(),
        birth.date,
        birth.time,
        birth.location
    );

    if let (Tier::Comprehensive, Some(partner)) = (tier, partner) {
        let pb = &partner.birth_data;
        content.push_str(&format!(
            "**Partner Birth Details:** {} at {} in {}\n",
            pb.date, pb.time, pb.location
        ));
    }

    for section in sections_for(tier) {
        content.push_str(&format!("\n## {}\n\n", section.title));
        content.push_str(&section_body(section.title, chart, partner));
        content.push('\n');
    }

    content.push_str("\nTrust the journey and embrace your growth! ✨\n");
    content
}

fn section_body(title: &str, chart: &ChartPayload, partner: Option<&ChartPayload>) -> String {
    let sun = chart.sign_of(Planet::Sun);
    let moon = chart.sign_of(Planet::Moon);
    let mercury = chart.sign_of(Planet::Mercury);
    let venus = chart.sign_of(Planet::Venus);
    let mars = chart.sign_of(Planet::Mars);
    let jupiter = chart.sign_of(Planet::Jupiter);
    let saturn = chart.sign_of(Planet::Saturn);

    match title {
        "Core Personality" | "Complete Personality Profile" => format!(
            "Your {sun} Sun reveals a natural leader with strong determination. Combined with \
your {moon} Moon, you have a unique blend of confidence and emotional sensitivity that makes \
you both inspiring and approachable.\n\nYou naturally express yourself through your {mercury} \
Mercury, making you excellent at connecting with others and sharing your ideas. Your key \
strength is the ability to adapt to different situations while staying true to your core \
values."
        ),
        "Life Purpose" | "Soul Mission & Karmic Patterns" => format!(
            "Your soul has chosen this incarnation to learn important lessons about {saturn} \
discipline and {jupiter} expansion. You are here to develop your communication skills and share \
your wisdom with others, particularly in areas related to helping people grow.\n\nYour main \
lesson is balancing natural leadership with humility and service."
        ),
        "Relationships & Career" => format!(
            "In relationships, your {venus} Venus shows you seek harmony and mutual respect. You \
value deep connections and need partners who appreciate your emotional depth.\n\nFor career, \
your {mars} Mars energy drives you toward dynamic work where you can make a difference — roles \
that combine leadership with helping others."
        ),
        "Current Growth" => "This is a time of significant personal development. Focus on \
building self-confidence, trusting your intuition, and setting healthy boundaries.\n\n\
**Practical Tips:**\n1. Start each day with 10 minutes of meditation\n2. Journal your thoughts \
regularly\n3. Practice active listening\n4. Set clear goals and take small steps toward them\n\
5. Surround yourself with supportive people"
            .into(),
        "Relationship Blueprint" => format!(
            "Your {venus} Venus placement reveals a deep need for authentic, soul-level \
connections. You bring emotional depth, loyalty, and a natural ability to nurture your partner, \
and you need partners who can meet your intensity.\n\nFamily dynamics have shaped your approach \
to relationships; learning to hold boundaries while staying open to love is a key lesson."
        ),
        "Career & Life Purpose" => format!(
            "Your {mars} Mars energy points toward careers that combine creativity with helping \
others. Your work style is marked by deep focus and emotional investment — you don't just do a \
job, you pour your heart into it.\n\nFinancial patterns show generosity toward others, sometimes \
at the expense of your own needs; learning to value your worth matters for your growth."
        ),
        "Complete House Analysis" => {
            let first = chart.houses.first();
            let tenth = chart.houses.get(9);
            format!(
                "Your {} first house emphasizes self-identity and personal development — you are \
constantly evolving and redefining who you are.\n\nThe {} tenth house reveals your career \
aspirations and public image: you are meant to be seen and recognized for your unique gifts.",
                first.map_or("rising", |h| h.sign.as_str()),
                tenth.map_or("midheaven", |h| h.sign.as_str())
            )
        }
        "Advanced Aspect Analysis" => {
            let lead = chart.aspects.first();
            format!(
                "The {} creates a powerful dynamic between your conscious and unconscious mind, \
giving you unusual insight into human nature.\n\nYour harmonious aspects show natural talents \
you can lean on, while the challenging ones mark the places where growth is asking to happen.",
                lead.map_or("Sun-Moon contact".to_string(), |a| format!(
                    "{} {} {} aspect",
                    a.planet1, a.aspect_type, a.planet2
                ))
            )
        }
        "Life Cycles & Timing" => "You are currently in a period of deep transformation. Major \
transitions are occurring in relationships, career, and personal development — make important \
decisions with careful consideration rather than urgency."
            .into(),
        "Shadow Work & Healing" => "Your shadow side may show up as perfectionism, fear of \
vulnerability, and a tendency to overanalyze. Healing opportunities center on self-compassion, \
trusting your intuition, and releasing patterns that no longer serve you."
            .into(),
        "Practical Application" => "**Daily Practices:**\n1. Morning meditation focused on \
self-acceptance\n2. Regular journaling of insights\n3. Creative expression through art, writing, \
or music\n4. Time in nature to ground and recharge\n5. Boundary practice: saying no without \
guilt\n6. Connecting with supportive community\n7. Prioritizing rest and emotional processing"
            .into(),
        "Future Guidance" => "The coming years bring opportunities for meaningful relationships, \
career growth, and recognition of your gifts. Prepare by continuing your inner work and staying \
open to opportunities for growth and service."
            .into(),

        // Synastry sections
        "Overall Compatibility Assessment" => partner_line(
            chart,
            partner,
            "show a strong karmic connection with genuine long-term potential. The partnership's \
key strength is complementary energy; its challenge is learning to honor two different rhythms.",
        ),
        "Communication & Mental Connection" => partner_line(
            chart,
            partner,
            "suggest complementary communication styles. One of you processes out loud while the \
other reflects first — naming that difference turns friction into understanding.",
        ),
        "Emotional & Intimate Connection" => partner_line(
            chart,
            partner,
            "indicate warm romantic attraction and emotional compatibility. You support each \
other best by making space for feelings before solutions.",
        ),
        "Power Dynamics & Life Goals" => partner_line(
            chart,
            partner,
            "show aligned core identities with distinct ambitions. Leadership flows best when it \
alternates with the season of life you are each in.",
        ),
        "Practical & Daily Life" => partner_line(
            chart,
            partner,
            "point to solid commitment potential. Shared routines and honest money conversations \
are the foundation stones here.",
        ),
        "Spiritual & Growth Connection" => partner_line(
            chart,
            partner,
            "reveal a shared appetite for growth. You help each other evolve by trading \
optimism for groundedness and back again.",
        ),
        "Challenges & Growth Areas" => partner_line(
            chart,
            partner,
            "mark where conflict can flare: pace, priorities, and pride. Working through \
difficulties together is itself the growth area.",
        ),
        "Harmonious Aspects & Strengths" => partner_line(
            chart,
            partner,
            "carry natural harmony — trines and sextiles that make ease feel effortless. Lean on \
these shared talents when the harder aspects activate.",
        ),
        "Timing & Relationship Phases" => partner_line(
            chart,
            partner,
            "suggest you are entering a consolidating phase. Major decisions land best after the \
current transition settles.",
        ),
        "Practical Recommendations" => "**For the relationship:**\n1. A weekly check-in \
conversation, phones away\n2. Name needs directly instead of testing\n3. Alternate planning and \
following\n4. Protect individual time without scorekeeping\n5. Celebrate small wins together\n\
6. Revisit shared goals each season"
            .into(),
        "Future Potential & Guidance" => partner_line(
            chart,
            partner,
            "hold real long-term potential. Maintain the connection by continuing to choose each \
other deliberately, especially through the challenging transits.",
        ),

        _ => "This area of your chart rewards attention and honest reflection.".into(),
    }
}

fn partner_line(chart: &ChartPayload, partner: Option<&ChartPayload>, rest: &str) -> String {
    let sun = chart.sign_of(Planet::Sun);
    let partner_sun = partner.map_or("their sign", |p| p.sign_of(Planet::Sun));
    format!("Your {sun} Sun and your partner's {partner_sun} Sun {rest}")
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
    fn test_mock_reports_carry_full_outline() {
        for tier in [Tier::Basic, Tier::Detailed, Tier::Comprehensive] {
            let partner = chart();
            let content = mock_report(&chart(), Some(&partner), tier);
            for section in sections_for(tier) {
                assert!(
                    content.contains(&format!("## {}", section.title)),
                    "{} report missing section {}",
                    tier,
                    section.title
                );
            }
        }
    }

    #[test]
    fn test_mock_report_reflects_chart() {
        let content = mock_report(&chart(), None, Tier::Basic);
        assert!(content.contains("Sofia, Bulgaria"));
        assert!(content.contains("Aries Sun"));
    }

    #[test]
    fn test_mock_model_tags() {
        assert_eq!(mock_model(Tier::Basic), "gpt-4-mock-basic");
        assert_eq!(mock_model(Tier::Comprehensive), "gpt-4-mock-comprehensive");
    }
}
