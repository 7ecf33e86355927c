//! Write payloads for menu items and news posts.
//!
//! Clients send either `multipart/form-data` (text fields plus `images`
//! file parts, with the kept URLs as a JSON array in `existingImages`) or a
//! plain JSON document with an `imageURLs` array.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::application::images::ImageUpload;
use crate::application::menu::MenuItemCommand;
use crate::application::news::NewsCommand;
use crate::domain::fields::{
    parse_calories, parse_posted_at, parse_price, price_from_number, validate_calories,
};

use super::error::{ApiError, codes};

const FILE_FIELDS: [&str; 2] = ["images", "images[]"];
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Body of a create or replace request.
#[derive(Debug)]
pub enum WritePayload {
    Form(FormPayload),
    Json(Bytes),
}

#[derive(Debug, Default)]
pub struct FormPayload {
    fields: HashMap<String, String>,
    uploads: Vec<ImageUpload>,
}

impl FormPayload {
    fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    fn required(&self, name: &'static str) -> &str {
        self.text(name).unwrap_or_default()
    }

    fn existing_images(&self) -> Result<Vec<String>, ApiError> {
        match self.text("existingImages").map(str::trim) {
            None | Some("") => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(raw).map_err(|err| {
                ApiError::bad_request(
                    "existingImages must be a JSON array of URLs",
                    Some(err.to_string()),
                )
            }),
        }
    }
}

impl<S> FromRequest<S> for WritePayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state).await.map_err(|rej| {
                ApiError::new(
                    rej.status(),
                    codes::BAD_REQUEST,
                    "Invalid multipart payload",
                    Some(rej.body_text()),
                )
            })?;
            return read_form(multipart).await.map(WritePayload::Form);
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rej| body_rejection(rej.status(), rej.body_text()))?;
        Ok(WritePayload::Json(bytes))
    }
}

async fn read_form(mut multipart: Multipart) -> Result<FormPayload, ApiError> {
    let mut form = FormPayload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| body_rejection(err.status(), err.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if FILE_FIELDS.contains(&name.as_str()) {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or(FALLBACK_CONTENT_TYPE)
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|err| body_rejection(err.status(), err.body_text()))?;
            // Browsers send an empty part when no file was picked.
            if filename.is_empty() && data.is_empty() {
                continue;
            }
            form.uploads.push(ImageUpload {
                filename,
                content_type,
                data,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|err| body_rejection(err.status(), err.body_text()))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

fn body_rejection(status: axum::http::StatusCode, detail: String) -> ApiError {
    if status == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(
            status,
            codes::PAYLOAD_TOO_LARGE,
            "Request body too large",
            Some(detail),
        )
    } else {
        ApiError::new(status, codes::BAD_REQUEST, "Invalid request body", Some(detail))
    }
}

#[derive(Debug, Deserialize)]
struct MenuItemJson {
    #[serde(default)]
    title: String,
    price: f64,
    #[serde(default)]
    calories: Option<i32>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: String,
    #[serde(default, rename = "imageURLs")]
    image_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsJson {
    #[serde(default)]
    title: String,
    #[serde(default)]
    preview: Option<String>,
    #[serde(default)]
    description: String,
    posted_at: String,
    #[serde(default, rename = "imageURLs")]
    image_urls: Vec<String>,
}

fn parse_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(bytes)
        .map_err(|err| ApiError::bad_request("Invalid JSON payload", Some(err.to_string())))
}

impl WritePayload {
    pub fn into_menu_command(self) -> Result<MenuItemCommand, ApiError> {
        match self {
            WritePayload::Form(form) => {
                let price = parse_price(form.required("price"))
                    .map_err(|err| ApiError::invalid_input("Invalid menu item", &err))?;
                let calories = parse_calories(form.text("calories"))
                    .map_err(|err| ApiError::invalid_input("Invalid menu item", &err))?;
                let kept_images = form.existing_images()?;
                Ok(MenuItemCommand {
                    title: form.required("title").to_string(),
                    price,
                    calories,
                    description: form.text("description").map(str::to_string),
                    category: form.required("category").to_string(),
                    kept_images,
                    uploads: form.uploads,
                })
            }
            WritePayload::Json(bytes) => {
                let body: MenuItemJson = parse_json(&bytes)?;
                let price = price_from_number(body.price)
                    .map_err(|err| ApiError::invalid_input("Invalid menu item", &err))?;
                let calories = validate_calories(body.calories)
                    .map_err(|err| ApiError::invalid_input("Invalid menu item", &err))?;
                Ok(MenuItemCommand {
                    title: body.title,
                    price,
                    calories,
                    description: body.description,
                    category: body.category,
                    kept_images: body.image_urls,
                    uploads: Vec::new(),
                })
            }
        }
    }

    pub fn into_news_command(self) -> Result<NewsCommand, ApiError> {
        match self {
            WritePayload::Form(form) => {
                let posted_at = parse_posted_at(form.required("postedAt"))
                    .map_err(|err| ApiError::invalid_input("Invalid news post", &err))?;
                let kept_images = form.existing_images()?;
                Ok(NewsCommand {
                    title: form.required("title").to_string(),
                    preview: form.text("preview").map(str::to_string),
                    description: form.required("description").to_string(),
                    posted_at,
                    kept_images,
                    uploads: form.uploads,
                })
            }
            WritePayload::Json(bytes) => {
                let body: NewsJson = parse_json(&bytes)?;
                let posted_at = parse_posted_at(&body.posted_at)
                    .map_err(|err| ApiError::invalid_input("Invalid news post", &err))?;
                Ok(NewsCommand {
                    title: body.title,
                    preview: body.preview,
                    description: body.description,
                    posted_at,
                    kept_images: body.image_urls,
                    uploads: Vec::new(),
                })
            }
        }
    }
}
