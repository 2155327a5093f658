use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const DAYS: u32 = 7;
pub const NOT_SPECIFIED: &str = "Not specified";
pub const UNSTRUCTURED_NOTE: &str =
    "The diet plan could not be parsed as JSON and was manually structured.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPlan {
    pub breakfast: String,
    pub morning_snack: String,
    pub lunch: String,
    pub evening_snack: String,
    pub dinner: String,
}

impl Default for DayPlan {
    fn default() -> Self {
        Self {
            breakfast: NOT_SPECIFIED.to_string(),
            morning_snack: NOT_SPECIFIED.to_string(),
            lunch: NOT_SPECIFIED.to_string(),
            evening_snack: NOT_SPECIFIED.to_string(),
            dinner: NOT_SPECIFIED.to_string(),
        }
    }
}

impl DayPlan {
    fn meal_mut(&mut self, meal: Meal) -> &mut String {
        match meal {
            Meal::Breakfast => &mut self.breakfast,
            Meal::MorningSnack => &mut self.morning_snack,
            Meal::Lunch => &mut self.lunch,
            Meal::EveningSnack => &mut self.evening_snack,
            Meal::Dinner => &mut self.dinner,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Meal {
    Breakfast,
    MorningSnack,
    Lunch,
    EveningSnack,
    Dinner,
}

impl Meal {
    const ALL: [Meal; 5] = [
        Meal::Breakfast,
        Meal::MorningSnack,
        Meal::Lunch,
        Meal::EveningSnack,
        Meal::Dinner,
    ];

    fn key(self) -> &'static str {
        match self {
            Meal::Breakfast => "breakfast",
            Meal::MorningSnack => "morning_snack",
            Meal::Lunch => "lunch",
            Meal::EveningSnack => "evening_snack",
            Meal::Dinner => "dinner",
        }
    }

    fn from_label(label: &str) -> Option<Meal> {
        let label = label.to_ascii_lowercase();
        if label.starts_with("breakfast") {
            Some(Meal::Breakfast)
        } else if label.starts_with("morning") || label.starts_with("mid-morning") {
            Some(Meal::MorningSnack)
        } else if label.starts_with("lunch") {
            Some(Meal::Lunch)
        } else if label.starts_with("evening") {
            Some(Meal::EveningSnack)
        } else if label.starts_with("dinner") {
            Some(Meal::Dinner)
        } else {
            None
        }
    }
}

/// Seven-day plan keyed `day1`..`day7`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredPlan {
    pub days: BTreeMap<String, DayPlan>,
    /// Set when the reply was not JSON and had to be read as free text.
    pub note: Option<&'static str>,
}

static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```json\s*(.*?)\s*```|```\s*(.*?)\s*```|(\{.*\})").expect("static pattern")
});
static DAY_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bday\s*(\d+)[:\s]*").expect("static pattern"));
static MEAL_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(breakfast|mid-morning\s+snack|morning\s+snack|lunch|evening\s+snack|dinner)\b[:\s\-]*")
        .expect("static pattern")
});

/// Pulls the JSON object out of a model reply that may wrap it in markdown
/// fences or surrounding prose.
pub fn extract_json(reply: &str) -> &str {
    let mut candidate = FENCED_JSON
        .captures(reply)
        .and_then(|caps| caps.iter().skip(1).flatten().next())
        .map_or(reply, |m| m.as_str())
        .trim();
    if let Some(start) = candidate.find('{') {
        candidate = &candidate[start..];
    }
    if let Some(end) = candidate.rfind('}') {
        candidate = &candidate[..=end];
    }
    candidate
}

pub fn structure(reply: &str) -> StructuredPlan {
    match serde_json::from_str::<Value>(extract_json(reply)) {
        Ok(Value::Object(map)) => StructuredPlan {
            days: (1..=DAYS)
                .map(|n| {
                    let key = format!("day{n}");
                    let day = map.get(&key).map(day_from_json).unwrap_or_default();
                    (key, day)
                })
                .collect(),
            note: None,
        },
        _ => StructuredPlan {
            days: from_free_text(reply),
            note: Some(UNSTRUCTURED_NOTE),
        },
    }
}

fn day_from_json(value: &Value) -> DayPlan {
    let mut day = DayPlan::default();
    for meal in Meal::ALL {
        match value.get(meal.key()) {
            Some(Value::String(s)) => *day.meal_mut(meal) = s.clone(),
            Some(Value::Null) | None => {}
            Some(other) => *day.meal_mut(meal) = other.to_string(),
        }
    }
    day
}

fn from_free_text(reply: &str) -> BTreeMap<String, DayPlan> {
    let headings: Vec<_> = DAY_HEADING.captures_iter(reply).collect();
    let mut days = BTreeMap::new();
    for (i, caps) in headings.iter().enumerate() {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let end = headings
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(reply.len(), |m| m.start());
        let section = &reply[whole.end()..end];
        days.insert(format!("day{}", &caps[1]), day_from_text(section));
    }
    if days.is_empty() {
        days = (1..=DAYS)
            .map(|n| (format!("day{n}"), DayPlan::default()))
            .collect();
    }
    days
}

/// Markdown emphasis and the quoting left behind by a cut-off JSON reply.
fn is_filler(c: char) -> bool {
    c.is_whitespace() || matches!(c, '*' | '"' | ',' | ':' | '{' | '}' | '[' | ']')
}

fn day_from_text(section: &str) -> DayPlan {
    let labels: Vec<_> = MEAL_LABEL.captures_iter(section).collect();
    let mut day = DayPlan::default();
    let mut seen = Vec::new();
    for (i, caps) in labels.iter().enumerate() {
        let Some(meal) = Meal::from_label(&caps[1]) else {
            continue;
        };
        if seen.contains(&meal) {
            continue;
        }
        seen.push(meal);
        let start = caps.get(0).map_or(0, |m| m.end());
        let end = labels
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(section.len(), |m| m.start());
        let text = section[start..end].trim_matches(is_filler);
        if !text.is_empty() {
            *day.meal_mut(meal) = text.to_string();
        }
    }
    day
}
