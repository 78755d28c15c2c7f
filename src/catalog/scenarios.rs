// Built-in scenarios
// Section plans for full songs, loops and live sets

use super::types::ScenarioTemplate;

fn scenario(name: &str, sections: &[&str], has_transitions: bool) -> ScenarioTemplate {
    ScenarioTemplate {
        name: name.to_string(),
        sections: sections.iter().map(|s| s.to_string()).collect(),
        has_transitions,
        has_variations: true,
    }
}

/// All built-in scenarios
pub fn builtin_scenarios() -> Vec<ScenarioTemplate> {
    vec![
        scenario(
            "full_song",
            &["intro", "verse", "chorus", "bridge", "outro"],
            true,
        ),
        scenario("loop_based", &["main_loop", "variation_1", "variation_2"], false),
        scenario(
            "live_performance",
            &["intro", "main", "breakdown", "build", "drop"],
            true,
        ),
    ]
}
