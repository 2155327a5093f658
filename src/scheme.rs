use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Health-scheme fields recognised in a labelled text passage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HealthScheme {
    pub scheme_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub how_to_apply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefits: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents_required: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
}

fn label(name: &str) -> Regex {
    Regex::new(&format!(r"(?i){name}:[ \t]*([^\n]+)")).expect("static label pattern")
}

static STATE: LazyLock<Regex> = LazyLock::new(|| label("State"));
static DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| label("Description"));
static ELIGIBILITY: LazyLock<Regex> = LazyLock::new(|| label("Eligibility"));
static HOW_TO_APPLY: LazyLock<Regex> = LazyLock::new(|| label(r"How to Apply"));
static BENEFITS: LazyLock<Regex> = LazyLock::new(|| label("Benefits"));
static DOCUMENTS: LazyLock<Regex> = LazyLock::new(|| label("Documents Required"));
static CONTACT: LazyLock<Regex> = LazyLock::new(|| label("Contact"));

fn capture(re: &Regex, content: &str) -> Option<String> {
    re.captures(content)
        .map(|c| c[1].trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads `content` as a scheme description. Returns `None` when no labelled
/// field is present, i.e. the passage is ordinary prose.
pub fn parse(content: &str) -> Option<HealthScheme> {
    let scheme = HealthScheme {
        scheme_name: content
            .trim()
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string(),
        state: capture(&STATE, content),
        description: capture(&DESCRIPTION, content),
        eligibility: capture(&ELIGIBILITY, content),
        how_to_apply: capture(&HOW_TO_APPLY, content),
        benefits: capture(&BENEFITS, content),
        documents_required: capture(&DOCUMENTS, content),
        contact_info: capture(&CONTACT, content),
    };

    let labelled = [
        &scheme.state,
        &scheme.description,
        &scheme.eligibility,
        &scheme.how_to_apply,
        &scheme.benefits,
        &scheme.documents_required,
        &scheme.contact_info,
    ];
    labelled.iter().any(|f| f.is_some()).then_some(scheme)
}
