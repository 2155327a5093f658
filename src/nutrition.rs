use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::diet_plan::{self, DayPlan};
use crate::error::AppError;
use crate::search;
use crate::state::AppState;

const REGION_KEYWORDS: [&str; 7] = [
    "region", "state", "city", "district", "area", "from", "lives in",
];

#[derive(Debug, Serialize)]
pub struct Source {
    pub filename: String,
    pub page: u32,
    pub score: f32,
}

#[derive(Debug, Serialize)]
pub struct Recommendation {
    /// The model's reply, unmodified.
    pub recommendation: String,
    pub diet_plan: BTreeMap<String, DayPlan>,
    pub region: String,
    /// Passages the prompt was grounded on.
    pub sources: Vec<Source>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

/// Best-effort guess at where the person lives: the one or two words after
/// the first location keyword in the query.
pub fn detect_region(query: &str) -> String {
    let lower = query.to_lowercase();
    for keyword in REGION_KEYWORDS {
        let Some(after) = lower.split(keyword).nth(1) else {
            continue;
        };
        let words: Vec<&str> = after
            .split_whitespace()
            .take(2)
            .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()))
            .filter(|w| !w.is_empty())
            .collect();
        if !words.is_empty() {
            return words.join(" ");
        }
    }
    "unknown".to_string()
}

pub fn build_prompt(query: &str, context: &str, region: &str) -> String {
    format!(
        r#"
You are a nutrition expert specializing in maternal health. Based on the following information about a pregnant woman and nutritional guidelines, create a personalized 7-day diet plan.

Woman's details: {query}

Relevant nutrition information: {context}

Geographic region: {region}

Create a detailed 7-day diet plan specifically tailored for this pregnant woman considering her geographical region, local food availability, and nutritional needs. Include breakfast, lunch, dinner, and snacks for each day. Focus on providing adequate protein, iron, folate, calcium, and other essential nutrients for pregnancy.

Your response should be in a structured JSON format with the following structure:
{{
  "day1": {{
    "breakfast": "Detailed breakfast description",
    "morning_snack": "Detailed morning snack description",
    "lunch": "Detailed lunch description",
    "evening_snack": "Detailed evening snack description",
    "dinner": "Detailed dinner description"
  }},
  ... and so on for all 7 days
}}

Make sure your response is valid JSON that can be parsed directly.
"#
    )
}

pub async fn recommend(
    state: &AppState,
    query: &str,
    limit: u64,
) -> Result<Recommendation, AppError> {
    let collection = state.collections.nutrition.as_str();
    let hits = search::semantic_search(state, collection, query, limit).await?;

    let context = hits
        .iter()
        .map(|h| h.payload.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let region = detect_region(query);
    info!(region = %region, passages = hits.len(), "building nutrition prompt");

    let prompt = build_prompt(query.trim(), &context, &region);
    let reply = state.llm.complete(&prompt).await?;
    let plan = diet_plan::structure(&reply);

    Ok(Recommendation {
        recommendation: reply,
        diet_plan: plan.days,
        region,
        sources: hits
            .into_iter()
            .map(|h| Source {
                filename: h.payload.filename,
                page: h.payload.page,
                score: h.score,
            })
            .collect(),
        note: plan.note,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_follows_the_first_keyword() {
        assert_eq!(
            detect_region("I am 26 weeks pregnant and I am from Kerala, India"),
            "kerala india"
        );
        assert_eq!(detect_region("Vegetarian, lives in Pune"), "pune");
    }

    #[test]
    fn keyword_order_decides_between_matches() {
        // "state" is checked before "from".
        assert_eq!(detect_region("from village, state Bihar"), "bihar");
    }

    #[test]
    fn region_is_unknown_without_keywords() {
        assert_eq!(detect_region("28 years old, second trimester"), "unknown");
    }

    #[test]
    fn prompt_embeds_query_context_and_region() {
        let prompt = build_prompt("anaemic, 30 weeks", "Spinach is rich in iron.", "goa");
        assert!(prompt.contains("Woman's details: anaemic, 30 weeks"));
        assert!(prompt.contains("Relevant nutrition information: Spinach is rich in iron."));
        assert!(prompt.contains("Geographic region: goa"));
        assert!(prompt.contains("\"morning_snack\""));
    }
}
