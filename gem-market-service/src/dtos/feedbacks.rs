use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Feedback;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeedbackRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 120, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 2000, message = "message is required"))]
    pub message: String,
    #[serde(default)]
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFeedbackRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub message: Option<String>,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedbackListParams {
    pub rating: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub rating: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Feedback> for FeedbackResponse {
    fn from(feedback: Feedback) -> Self {
        Self {
            id: feedback.id,
            name: feedback.name,
            email: feedback.email,
            message: feedback.message,
            rating: feedback.rating,
            created_at: feedback.created_at.to_rfc3339(),
            updated_at: feedback.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedbackEnvelope {
    pub success: bool,
    pub feedback: FeedbackResponse,
}

impl From<Feedback> for FeedbackEnvelope {
    fn from(feedback: Feedback) -> Self {
        Self {
            success: true,
            feedback: feedback.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedbackListResponse {
    pub success: bool,
    pub count: usize,
    pub feedbacks: Vec<FeedbackResponse>,
}

impl From<Vec<Feedback>> for FeedbackListResponse {
    fn from(feedbacks: Vec<Feedback>) -> Self {
        Self {
            success: true,
            count: feedbacks.len(),
            feedbacks: feedbacks.into_iter().map(Into::into).collect(),
        }
    }
}
