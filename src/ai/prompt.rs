// src/ai/prompt.rs
//! Prompt builders for the two summary shapes. Input text is capped to keep
//! token spend bounded; the instructions ask for ONLY-JSON output, which the
//! normalizer then recovers defensively anyway.

use crate::ai::normalize::SummarySchema;

/// Cap on discussion text embedded into a prompt.
pub const MAX_PROMPT_TEXT_CHARS: usize = 10_000;

pub fn build(schema: SummarySchema, text: &str, city: &str) -> String {
    match schema {
        SummarySchema::CityOverview => city_overview(text, city),
        SummarySchema::PostAnalysis => post_analysis(text, city),
    }
}

fn capped(text: &str) -> String {
    text.chars().take(MAX_PROMPT_TEXT_CHARS).collect()
}

fn city_overview(text: &str, city: &str) -> String {
    format!(
        r#"You are analyzing Reddit discussions about FOOD and RESTAURANTS in Indian cities for a city food dashboard.

Your job is to extract useful, structured insights from the provided text.

Return ONLY valid JSON with these specific fields and structure:
{{
    "city_overview": "A 1-2 sentence high-level summary of {city}'s food discussion focus (e.g., 'Discussions focus on finding budget-friendly biryani and late-night food.').",
    "top_recommendations": [
        {{
            "category": "Biryani / Non-Veg" | "Cafe for Work" | "Budget Food" | "Fine Dining" | "Street Food" | "Pure Veg" | "Desserts" | "Fast Food" | "Beach View Cafe",
            "restaurant_name": "The single most recommended or discussed place for this category.",
            "popular_dish": "The specific dish or item mentioned (e.g., 'Chicken Biryani', 'Dosa', 'Pour Over Coffee').",
            "reason": "Why it is recommended (e.g., 'Best flavor', 'Good Wi-Fi', 'Affordable', 'Excellent view')."
        }}
    ],
    "major_complaints": [
        {{
            "restaurant_name": "The restaurant with the most serious or repeated complaint (e.g., food poisoning, poor quality, high price for value).",
            "issue": "A brief description of the complaint.",
            "sentiment": "Negative"
        }}
    ]
}}

Analyze the provided text and populate the fields.
If a category or complaint is not present, omit that array element.
Do not use phrases like 'users said' or 'the post describes'.

Text:
{text}"#,
        city = city,
        text = capped(text),
    )
}

fn post_analysis(text: &str, city: &str) -> String {
    format!(
        r#"You are analyzing ONE Reddit discussion thread about FOOD and RESTAURANTS in {city}.

Return ONLY valid JSON with these fields:
{{
    "intent": "What the thread is asking for (e.g., 'budget biryani recommendations').",
    "restaurant_names": ["Every restaurant mentioned by name."],
    "popular_foods": ["Dishes that come up repeatedly."],
    "overall_sentiment": "positive" | "neutral" | "negative",
    "summary": "A 1-2 sentence summary of what commenters agree on.",
    "key_finding": "The single most useful takeaway for a visitor."
}}

Do not use phrases like 'users said' or 'the post describes'.

Text:
{text}"#,
        city = city,
        text = capped(text),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_capped() {
        let long = "x".repeat(MAX_PROMPT_TEXT_CHARS * 2);
        let p = build(SummarySchema::CityOverview, &long, "Pune");
        // prompt = instructions + capped text; must not carry the full input
        assert!(p.len() < MAX_PROMPT_TEXT_CHARS + 3_000);
    }

    #[test]
    fn city_name_is_interpolated() {
        let p = build(SummarySchema::CityOverview, "some text", "Hyderabad");
        assert!(p.contains("Hyderabad's food discussion focus"));
        let p = build(SummarySchema::PostAnalysis, "some text", "Chennai");
        assert!(p.contains("RESTAURANTS in Chennai"));
    }

    #[test]
    fn both_prompts_demand_json_only() {
        for schema in [SummarySchema::CityOverview, SummarySchema::PostAnalysis] {
            assert!(build(schema, "t", "Pune").contains("Return ONLY valid JSON"));
        }
    }
}
