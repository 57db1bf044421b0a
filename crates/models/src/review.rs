use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Nanoseconds since the Unix epoch.
pub type Timestamp = u64;

pub const INVALID_PAYLOAD: &str = "Missing or invalid fields in the payload.";

/// A published review of a website.
///
/// `id` and `created_at` are fixed at creation. `updated_at` stays `None`
/// until the first update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub body: String,
    pub rating: f64,
    #[serde(rename = "websiteURL")]
    pub website_url: String,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Caller-supplied fields for create and update.
///
/// Fields default when absent from the input so that a missing field is
/// reported by `validate` instead of failing to decode.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewPayload {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default, rename = "websiteURL")]
    pub website_url: String,
}

impl ReviewPayload {
    pub fn new(body: impl Into<String>, rating: f64, website_url: impl Into<String>) -> Self {
        Self { body: body.into(), rating: Some(rating), website_url: website_url.into() }
    }

    /// Body and website must be non-empty and the rating present and finite.
    /// The rating range is not bounded.
    pub fn validate(&self) -> Result<f64, ModelError> {
        let rating = match self.rating {
            Some(r) if r.is_finite() => r,
            _ => return Err(ModelError::Validation(INVALID_PAYLOAD.into())),
        };
        if self.body.is_empty() || self.website_url.is_empty() {
            return Err(ModelError::Validation(INVALID_PAYLOAD.into()));
        }
        Ok(rating)
    }
}

impl Review {
    pub fn create(id: String, payload: ReviewPayload, now: Timestamp) -> Result<Self, ModelError> {
        let rating = payload.validate()?;
        Ok(Self {
            id,
            body: payload.body,
            rating,
            website_url: payload.website_url,
            created_at: now,
            updated_at: None,
        })
    }

    /// Replaces the editable fields and stamps `updated_at`.
    ///
    /// The stamp never falls below `created_at` or a previous stamp, whatever
    /// the clock reports.
    pub fn apply_update(&mut self, payload: ReviewPayload, now: Timestamp) -> Result<(), ModelError> {
        let rating = payload.validate()?;
        let floor = match self.updated_at {
            Some(prev) => prev.max(self.created_at),
            None => self.created_at,
        };
        self.body = payload.body;
        self.rating = rating;
        self.website_url = payload.website_url;
        self.updated_at = Some(now.max(floor));
        Ok(())
    }
}
