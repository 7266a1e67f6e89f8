use serde::{Deserialize, Serialize};

use crate::models::{ActionKind, Language, MatchKind, MatchOutcome, MessageKind, Theme};

// -- Profile --

/// Full profile as returned to the owning user.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub telegram_user_id: i64,
    pub first_name: String,
    pub username: String,
    pub photos: Vec<String>,
    pub description: String,
    pub language: Language,
    pub theme: Theme,
    pub film_grain: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: Profile,
}

/// Partial profile update. Absent fields are left untouched; each present
/// field has exactly one validation rule (see the profile handler).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub photos: Option<Vec<String>>,
    pub description: Option<String>,
    pub language: Option<Language>,
    pub theme: Option<Theme>,
    pub film_grain: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddPhotoRequest {
    pub photo_url: String,
}

#[derive(Debug, Serialize)]
pub struct AddPhotoResponse {
    pub success: bool,
    pub photos: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NextResponse {
    pub user: Option<Profile>,
}

// -- Actions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SubmitActionRequest {
    pub to_user_id: i64,
    /// Raw kind string; validated against the action vocabulary in the handler.
    pub action: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitActionResponse {
    pub success: bool,
    pub match_type: MatchOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

// -- Matches --

#[derive(Debug, Serialize)]
pub struct MatchSummary {
    pub id: i64,
    #[serde(rename = "partnerId")]
    pub partner_id: i64,
    #[serde(rename = "partnerName")]
    pub partner_name: String,
    #[serde(rename = "partnerPhotos")]
    pub partner_photos: Vec<String>,
    #[serde(rename = "type")]
    pub kind: MatchKind,
    pub created_at: i64,
}

#[derive(Debug, Serialize)]
pub struct MatchListResponse {
    pub matches: Vec<MatchSummary>,
}

#[derive(Debug, Serialize)]
pub struct PendingSummary {
    pub id: i64,
    #[serde(rename = "partnerId")]
    pub partner_id: i64,
    #[serde(rename = "partnerName")]
    pub partner_name: String,
    #[serde(rename = "partnerPhotos")]
    pub partner_photos: Vec<String>,
    #[serde(rename = "myConfirmed")]
    pub my_confirmed: bool,
    #[serde(rename = "partnerConfirmed")]
    pub partner_confirmed: bool,
    pub created_at: i64,
}

#[derive(Debug, Serialize)]
pub struct PendingListResponse {
    pub pending: Vec<PendingSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ConfirmMatchRequest {
    pub match_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmMatchResponse {
    pub success: bool,
    pub both_confirmed: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct DeclineMatchRequest {
    pub match_id: i64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

// -- Chat --

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: i64,
    pub chat_id: i64,
    pub sender_id: i64,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    pub blurred: bool,
    pub timestamp: i64,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    /// Raw kind string; validated against the message vocabulary in the handler.
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    #[serde(default)]
    pub blurred: bool,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub success: bool,
    pub message: ChatMessage,
}

#[derive(Debug, Serialize)]
pub struct ToggleBlurResponse {
    pub success: bool,
    pub blurred: bool,
}
