use super::ResponseEngine;

pub const GREETING: &str = "Hello! I'm HealBuddy AI Assistant. How can I help you today? \
Please describe your symptoms or health concerns.";

pub const FALLBACK_REPLY: &str = "Thank you for your message. I'm here to help. Could you \
provide more details about your symptoms? Remember, I provide general health information \
and you should consult a healthcare professional for diagnosis.";

/// Ordered keyword table. Earlier entries win when a message mentions several.
const DEFAULT_RULES: &[(&str, &str)] = &[
    (
        "fever",
        "High fever can be serious. Stay hydrated, take rest, and monitor your temperature. \
If fever persists for more than 3 days or exceeds 103°F (39.4°C), please consult a \
healthcare professional immediately.",
    ),
    (
        "cough",
        "A persistent cough may indicate various conditions. Drink warm liquids, use honey, \
and get plenty of rest. If the cough lasts more than 2 weeks or you cough up blood, seek \
medical advice.",
    ),
    (
        "sprain",
        "For a sprain, remember RICE: Rest, Ice (15-20 mins), Compression, and Elevation. \
Avoid putting weight on the injured area. If pain or swelling persists, consult a doctor.",
    ),
    (
        "headache",
        "For a headache, rest in a quiet, dark room, stay hydrated, and try relaxation \
techniques. If headaches are severe or frequent, please consult a healthcare professional.",
    ),
];

/// A single keyword → response pair. Keywords are stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule {
    keyword: String,
    response: String,
}

impl KeywordRule {
    pub fn new(keyword: &str, response: &str) -> Self {
        Self {
            keyword: keyword.to_lowercase(),
            response: response.to_string(),
        }
    }

    fn matches(&self, lowered_message: &str) -> bool {
        lowered_message.contains(&self.keyword)
    }
}

/// Case-insensitive substring matcher over an ordered rule list; first match wins.
#[derive(Debug, Clone)]
pub struct KeywordEngine {
    rules: Vec<KeywordRule>,
    fallback: String,
    greeting: String,
}

impl KeywordEngine {
    pub fn with_rules(rules: Vec<KeywordRule>, fallback: &str) -> Self {
        Self {
            rules,
            fallback: fallback.to_string(),
            greeting: GREETING.to_string(),
        }
    }
}

impl Default for KeywordEngine {
    fn default() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .map(|(keyword, response)| KeywordRule::new(keyword, response))
            .collect();
        Self::with_rules(rules, FALLBACK_REPLY)
    }
}

impl ResponseEngine for KeywordEngine {
    fn greeting(&self) -> String {
        self.greeting.clone()
    }

    fn reply(&self, message: &str) -> String {
        let lowered = message.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.response.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }
}
