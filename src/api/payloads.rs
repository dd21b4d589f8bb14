//! JSON request bodies and query strings.

use crate::chat::domain::MessageDraft;
use crate::error::{MarketplaceError, MarketplaceResult};
use crate::identity::domain::ProfileUpdate;
use crate::ids::{TaskId, UserId};
use crate::payments::domain::Money;
use crate::task::domain::{PartyRole, TaskCategory, TaskRequirements, TaskStatus};
use crate::task::services::{CreateTaskRequest, OpenDisputeRequest, TaskListQuery};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Decodes a JSON body. An empty body decodes as `{}`.
pub(super) fn decode<T: DeserializeOwned>(body: &[u8]) -> MarketplaceResult<T> {
    let raw = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };
    serde_json::from_slice(raw)
        .map_err(|err| MarketplaceError::validation(format!("invalid request body: {err}")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SendCodeBody {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct VerifyCodeBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProfileBody {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub default_zip_code: Option<String>,
}

impl From<ProfileBody> for ProfileUpdate {
    fn from(body: ProfileBody) -> Self {
        let mut update = Self::new();
        if let Some(name) = body.name {
            update = update.with_name(name);
        }
        if let Some(phone) = body.phone {
            update = update.with_phone(phone);
        }
        if let Some(zip) = body.default_zip_code {
            update = update.with_default_zip_code(zip);
        }
        update
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PhotoBody {
    #[serde(default)]
    pub photo_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateTaskBody {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub zip_code: String,
    pub area_description: Option<String>,
    pub full_address: Option<String>,
    pub price: Option<Money>,
    #[serde(default)]
    pub photos_required: bool,
    #[serde(default)]
    pub tools_required: bool,
    #[serde(default)]
    pub tools_provided: bool,
    #[serde(default)]
    pub license_required: bool,
    pub task_photo_url: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl CreateTaskBody {
    pub fn into_request(self) -> MarketplaceResult<CreateTaskRequest> {
        let category = match self.category.as_deref() {
            Some(raw) => TaskCategory::try_from(raw)
                .map_err(|err| MarketplaceError::validation(err.to_string()))?,
            None => TaskCategory::Other,
        };
        let price = self
            .price
            .ok_or_else(|| MarketplaceError::validation("price is required"))?;
        let photos = self.task_photo_url.into_iter().chain(self.photos);

        let mut request = CreateTaskRequest::new(self.title, category, self.zip_code, price)
            .with_requirements(TaskRequirements {
                photos_required: self.photos_required,
                tools_required: self.tools_required,
                tools_provided: self.tools_provided,
                license_required: self.license_required,
            })
            .with_photos(photos);
        if let Some(description) = self.description {
            request = request.with_description(description);
        }
        if let Some(area) = self.area_description {
            request = request.with_area_description(area);
        }
        if let Some(address) = self.full_address {
            request = request.with_full_address(address);
        }
        Ok(request)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OfferBody {
    pub note: Option<String>,
    pub proposed_price: Option<Money>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChooseHelperBody {
    pub helper_id: Option<UserId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CancelBody {
    pub canceled_by: Option<String>,
}

impl CancelBody {
    pub fn role(&self) -> MarketplaceResult<PartyRole> {
        let raw = self
            .canceled_by
            .as_deref()
            .ok_or_else(|| MarketplaceError::validation("canceledBy is required"))?;
        PartyRole::try_from(raw).map_err(|err| MarketplaceError::validation(err.to_string()))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DisputeBody {
    pub reason: Option<String>,
    #[serde(default)]
    pub photo_urls: Vec<String>,
}

impl From<DisputeBody> for OpenDisputeRequest {
    fn from(body: DisputeBody) -> Self {
        Self {
            reason: body.reason,
            photo_urls: body.photo_urls,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EvidenceBody {
    #[serde(default)]
    pub photo_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AmountBody {
    pub amount: Option<Money>,
}

impl AmountBody {
    pub fn amount(&self) -> MarketplaceResult<Money> {
        self.amount
            .ok_or_else(|| MarketplaceError::validation("amount is required"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ExtraWorkBody {
    pub amount: Option<Money>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub photo_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PriceBody {
    pub new_price: Option<Money>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MessageBody {
    pub text: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_proof: bool,
}

impl From<MessageBody> for MessageDraft {
    fn from(body: MessageBody) -> Self {
        Self {
            text: body.text,
            image_url: body.image_url,
            is_proof: body.is_proof,
        }
    }
}

/// Parsed query string.
#[derive(Debug, Default)]
pub(super) struct Query(HashMap<String, String>);

impl Query {
    pub fn parse(raw: Option<&str>) -> Self {
        Self(
            raw.map(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .filter(|(_, value)| !value.trim().is_empty())
                    .collect()
            })
            .unwrap_or_default(),
        )
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|value| value.trim())
    }

    fn flag(&self, key: &str) -> MarketplaceResult<Option<bool>> {
        self.get(key)
            .map(|raw| match raw {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(MarketplaceError::validation(format!(
                    "{key} must be true or false"
                ))),
            })
            .transpose()
    }

    fn id<T: std::str::FromStr>(&self, key: &str) -> MarketplaceResult<Option<T>> {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| MarketplaceError::validation(format!("{key} is not a valid id")))
            })
            .transpose()
    }

    pub fn task_list(&self) -> MarketplaceResult<TaskListQuery> {
        let status = self
            .get("status")
            .map(|raw| {
                TaskStatus::try_from(raw).map_err(|err| MarketplaceError::validation(err.to_string()))
            })
            .transpose()?;
        let category = self
            .get("category")
            .map(|raw| {
                TaskCategory::try_from(raw)
                    .map_err(|err| MarketplaceError::validation(err.to_string()))
            })
            .transpose()?;
        Ok(TaskListQuery {
            status,
            zip_code: self.get("zipCode").map(str::to_owned),
            category,
            tools_required: self.flag("toolsRequired")?,
            tools_provided: self.flag("toolsProvided")?,
            include_expired: self.flag("includeExpired")?.unwrap_or(false),
        })
    }

    pub fn activity_filter(
        &self,
    ) -> MarketplaceResult<(Option<TaskId>, Option<UserId>, Option<usize>)> {
        let limit = self
            .get("limit")
            .map(|raw| {
                raw.parse::<usize>()
                    .map_err(|_| MarketplaceError::validation("limit must be a positive integer"))
            })
            .transpose()?;
        Ok((self.id("taskId")?, self.id("userId")?, limit))
    }
}
