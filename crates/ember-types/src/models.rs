use serde::{Deserialize, Serialize};

/// Profile photo list cap, enforced on update and append.
pub const MAX_PHOTOS: usize = 5;

/// Profile description cap in characters; longer text is truncated.
pub const MAX_DESCRIPTION_CHARS: usize = 300;

/// Caller identity embedded in the signed init data `user` field.
/// Shared between ember-api (verification side) and ember-bot (signing side).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

/// The one-way preference a user records about another profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Fuck,
    Marry,
    Kill,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fuck => "fuck",
            Self::Marry => "marry",
            Self::Kill => "kill",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "fuck" => Some(Self::Fuck),
            "marry" => Some(Self::Marry),
            "kill" => Some(Self::Kill),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Instant,
    Conditional,
}

impl MatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Instant => "instant",
            Self::Conditional => "conditional",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "instant" => Some(Self::Instant),
            "conditional" => Some(Self::Conditional),
            _ => None,
        }
    }
}

/// What an action submission produced, as reported back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOutcome {
    None,
    Instant,
    Conditional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Photo,
    Audio,
    Gift,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Photo => "photo",
            Self::Audio => "audio",
            Self::Gift => "gift",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "photo" => Some(Self::Photo),
            "audio" => Some(Self::Audio),
            "gift" => Some(Self::Gift),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ru,
    En,
    Ar,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ru => "ru",
            Self::En => "en",
            Self::Ar => "ar",
        }
    }

    /// Map a Telegram `language_code` onto a supported language.
    /// Anything outside en/ar falls back to ru.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("en") => Self::En,
            Some("ar") => Self::Ar,
            _ => Self::Ru,
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "en" => Self::En,
            "ar" => Self::Ar,
            _ => Self::Ru,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "dark" => Self::Dark,
            _ => Self::Light,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_kind_roundtrips_through_db_text() {
        for kind in [ActionKind::Fuck, ActionKind::Marry, ActionKind::Kill] {
            assert_eq!(ActionKind::from_db(kind.as_str()), Some(kind));
        }
        assert_eq!(ActionKind::from_db("snog"), None);
    }

    #[test]
    fn language_falls_back_to_ru() {
        assert_eq!(Language::from_code(Some("en")), Language::En);
        assert_eq!(Language::from_code(Some("ar")), Language::Ar);
        assert_eq!(Language::from_code(Some("de")), Language::Ru);
        assert_eq!(Language::from_code(None), Language::Ru);
    }

    #[test]
    fn enums_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&ActionKind::Marry).unwrap(), "\"marry\"");
        assert_eq!(serde_json::to_string(&MatchOutcome::None).unwrap(), "\"none\"");
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
    }
}
