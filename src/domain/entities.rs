//! Domain entities mirrored from persistent storage.
//!
//! The serde representation is the public wire format consumed by the site
//! frontend, hence the mixed `camelCase`/`snake_case` field names.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuCategoryRecord {
    pub id: i32,
    pub name_ru: String,
    pub name_en: String,
    pub sort_order: i32,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemRecord {
    pub id: i32,
    pub title: String,
    pub price: i32,
    #[serde(rename = "imageURLs", default)]
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Slug of the owning category (`menu_categories.name_en`).
    pub category: String,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "updatedAt", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsRecord {
    pub id: i32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    pub description: String,
    #[serde(rename = "imageURLs", default)]
    pub image_urls: Vec<String>,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "updatedAt", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(rename = "postedAt", with = "time::serde::rfc3339")]
    pub posted_at: OffsetDateTime,
}

/// A menu item that prevents a category from being removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockingItem {
    pub id: i32,
    pub title: String,
}

impl From<&MenuItemRecord> for BlockingItem {
    fn from(item: &MenuItemRecord) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn menu_item_uses_frontend_field_names() {
        let item = MenuItemRecord {
            id: 7,
            title: "Espresso".into(),
            price: 150,
            image_urls: vec!["/uploads/a.jpg".into()],
            calories: None,
            description: Some("Double shot".into()),
            category: "napitki".into(),
            created_at: datetime!(2025-03-01 09:30:00 UTC),
            updated_at: datetime!(2025-03-02 10:00:00 UTC),
        };

        let value = serde_json::to_value(&item).expect("serialize");
        assert_eq!(
            value,
            json!({
                "id": 7,
                "title": "Espresso",
                "price": 150,
                "imageURLs": ["/uploads/a.jpg"],
                "description": "Double shot",
                "category": "napitki",
                "createdAt": "2025-03-01T09:30:00Z",
                "updatedAt": "2025-03-02T10:00:00Z",
            })
        );

        let parsed: MenuItemRecord = serde_json::from_value(value).expect("deserialize");
        assert_eq!(parsed, item);
    }

    #[test]
    fn news_round_trips_with_optional_preview() {
        let news = NewsRecord {
            id: 3,
            title: "Summer terrace".into(),
            preview: Some("Opening soon".into()),
            description: "The terrace opens on Friday.".into(),
            image_urls: Vec::new(),
            created_at: datetime!(2025-05-01 08:00:00 UTC),
            updated_at: datetime!(2025-05-01 08:00:00 UTC),
            posted_at: datetime!(2025-05-10 12:00:00 +03:00),
        };

        let encoded = serde_json::to_string(&news).expect("serialize");
        assert!(encoded.contains("\"postedAt\":\"2025-05-10T12:00:00+03:00\""));

        let decoded: NewsRecord = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(decoded, news);
    }

    #[test]
    fn category_serializes_sort_order_in_snake_case() {
        let category = MenuCategoryRecord {
            id: 1,
            name_ru: "Напитки".into(),
            name_en: "napitki".into(),
            sort_order: 1,
            created_at: datetime!(2025-03-01 09:30:00 UTC),
        };

        let value = serde_json::to_value(&category).expect("serialize");
        assert_eq!(value["sort_order"], 1);
        assert_eq!(value["createdAt"], "2025-03-01T09:30:00Z");
        assert_eq!(value["name_en"], "napitki");
    }
}
