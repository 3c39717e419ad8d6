use astra_core::{numerology, ChartEngine, ChartRequest, Location, RuleEngine};
use chrono::{TimeZone, Utc};

fn main() {
    env_logger::init();

    let engine = ChartEngine::from_env();
    // ada, 15th march 1990 09:30, london
    let birth = Utc.with_ymd_and_hms(1990, 3, 15, 9, 30, 0).unwrap();
    let mut request = ChartRequest::natal(birth, Location::new(51.5074, -0.1278, "Europe/London"));
    request.subject = Some("Ada".to_string());

    let chart = engine.compute_chart(&request);
    println!("provider: {} ({:?})", chart.metadata.provider, chart.metadata.fallback);
    for planet in &chart.planets {
        println!(
            "{:<8} {:>7.2} {} house {:?}{}",
            planet.planet.to_string(),
            planet.degree,
            planet.sign,
            planet.house,
            if planet.retrograde { " R" } else { "" },
        );
    }

    let profile = numerology::profile_for("Ada Lovelace", birth.date_naive(), Utc::now().date_naive());
    let result = RuleEngine::new().evaluate("natal_love", &chart, None, None, Some(&profile));

    let mut topics: Vec<_> = result.topic_scores.iter().collect();
    topics.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
    println!("\ntopic scores ({} factors):", result.factors.len());
    for (topic, score) in topics {
        println!("{:<10} {:.3}", topic.to_string(), score);
    }
}
