//! Canned answers for common questions.
//!
//! These short-circuit the semantic pipeline for greetings and a handful of
//! ISS/NASA facts. Matching is on the lowercased, trimmed question.

/// Year the first ISS module (Zarya) was launched.
pub const ISS_LAUNCH_YEAR: i32 = 1998;

/// Topics with a fixed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaqTopic {
    Greeting,
    WhatIsIss,
    IssAge,
    NasaFounder,
    IssTemperature,
}

impl FaqTopic {
    /// Detect a canned topic in a normalized question.
    pub fn detect(query: &str) -> Option<Self> {
        if matches!(query, "hi" | "hello" | "hey") {
            return Some(Self::Greeting);
        }
        if query.contains("what is the international space station")
            || query.contains("what is the iss")
        {
            return Some(Self::WhatIsIss);
        }
        if query.contains("how old is the iss") {
            return Some(Self::IssAge);
        }
        if query.contains("founder of nasa") || query.contains("who founded nasa") {
            return Some(Self::NasaFounder);
        }
        if query.contains("temperature") && query.contains("iss") {
            return Some(Self::IssTemperature);
        }
        None
    }

    /// Answer text; `current_year` feeds the ISS age.
    pub fn answer(&self, current_year: i32) -> String {
        match self {
            Self::Greeting => "Hello! How can I help you with space biology today?".to_string(),
            Self::WhatIsIss => "The International Space Station (ISS) is a habitable artificial \
                                satellite in low Earth orbit, serving as a microgravity and space \
                                environment research laboratory."
                .to_string(),
            Self::IssAge => {
                let age = current_year - ISS_LAUNCH_YEAR;
                format!(
                    "The first component of the International Space Station was launched in \
                     {ISS_LAUNCH_YEAR}, making it {age} years old in {current_year}."
                )
            }
            Self::NasaFounder => {
                "NASA was established by President Dwight D. Eisenhower in 1958.".to_string()
            }
            Self::IssTemperature => {
                "The internal temperature on the ISS is kept at a comfortable 22°C (72°F)."
                    .to_string()
            }
        }
    }
}

/// Lowercase and trim a raw question.
pub fn normalize(question: &str) -> String {
    question.trim().to_lowercase()
}
