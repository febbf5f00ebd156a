use serde::{Deserialize, Serialize};

/// A live channel as listed by the catalog endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub title: String,
    #[serde(rename = "image", alias = "logo", default)]
    pub logo: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Response of `GET /api/player/categories`
#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesResponse {
    pub content: CategoriesContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesContent {
    #[serde(default)]
    pub data: Vec<Category>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub title: Option<String>,
    // Categories without an "items" key hold no channels
    #[serde(default)]
    pub items: Option<CategoryItems>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryItems {
    #[serde(default)]
    pub data: Vec<Channel>,
}
