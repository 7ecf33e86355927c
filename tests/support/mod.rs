//! In-memory repositories and router wiring shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, header};
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tower::ServiceExt;

use cafe_between::application::auth::{AuthConfig, AuthService};
use cafe_between::application::categories::CategoryRegistry;
use cafe_between::application::images::{DEFAULT_MAX_IMAGE_BYTES, ImageReconciler};
use cafe_between::application::menu::MenuService;
use cafe_between::application::news::NewsService;
use cafe_between::application::repos::{
    CategoriesRepo, CategoryRemoval, CategoryUpsert, HealthRepo, MenuItemParams, MenuRepo, NewsParams, NewsRepo,
    RepoError,
};
use cafe_between::cache::{CacheConfig, ReadCache};
use cafe_between::domain::entities::{MenuCategoryRecord, MenuItemRecord, NewsRecord};
use cafe_between::infra::http::{self, DEFAULT_MAX_REQUEST_BYTES, HttpState};
use cafe_between::infra::uploads::UploadStorage;

pub const ADMIN_PASSWORD: &str = "espresso-doppio";
pub const JWT_SECRET: &str = "test-secret";

#[derive(Default)]
struct Tables {
    categories: Vec<MenuCategoryRecord>,
    items: Vec<MenuItemRecord>,
    news: Vec<NewsRecord>,
    next_category_id: i32,
    next_item_id: i32,
    next_news_id: i32,
}

/// Stand-in for Postgres implementing every repository trait.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    pub item_list_queries: AtomicUsize,
    pub category_list_queries: AtomicUsize,
    pub fail_item_writes: AtomicBool,
}

impl MemoryStore {
    pub async fn categories(&self) -> Vec<MenuCategoryRecord> {
        let mut categories = self.tables.lock().await.categories.clone();
        sort_categories(&mut categories);
        categories
    }

    pub async fn items(&self) -> Vec<MenuItemRecord> {
        self.tables.lock().await.items.clone()
    }

    pub fn fail_item_writes(&self, fail: bool) {
        self.fail_item_writes.store(fail, Ordering::SeqCst);
    }

    fn check_item_write(&self) -> Result<(), RepoError> {
        if self.fail_item_writes.load(Ordering::SeqCst) {
            return Err(RepoError::Persistence("injected failure".into()));
        }
        Ok(())
    }
}

fn sort_categories(categories: &mut [MenuCategoryRecord]) {
    categories.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.name_ru.cmp(&b.name_ru))
    });
}

#[async_trait]
impl CategoriesRepo for MemoryStore {
    async fn upsert_category(
        &self,
        name_ru: &str,
        name_en: &str,
    ) -> Result<CategoryUpsert, RepoError> {
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables.categories.iter().find(|c| c.name_ru == name_ru) {
            return Ok(CategoryUpsert {
                id: existing.id,
                name_en: existing.name_en.clone(),
                created: false,
            });
        }
        if tables.categories.iter().any(|c| c.name_en == name_en) {
            return Err(RepoError::Duplicate {
                constraint: "menu_categories_name_en_key".into(),
            });
        }

        tables.next_category_id += 1;
        let id = tables.next_category_id;
        let sort_order = tables
            .categories
            .iter()
            .map(|c| c.sort_order)
            .max()
            .unwrap_or(0)
            + 1;
        tables.categories.push(MenuCategoryRecord {
            id,
            name_ru: name_ru.to_string(),
            name_en: name_en.to_string(),
            sort_order,
            created_at: OffsetDateTime::now_utc(),
        });
        Ok(CategoryUpsert {
            id,
            name_en: name_en.to_string(),
            created: true,
        })
    }

    async fn list_categories(&self) -> Result<Vec<MenuCategoryRecord>, RepoError> {
        self.category_list_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.categories().await)
    }

    async fn find_category(&self, id: i32) -> Result<Option<MenuCategoryRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn update_sort_order(&self, id: i32, sort_order: i32) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().await;
        let category = tables
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepoError::NotFound)?;
        category.sort_order = sort_order;
        Ok(())
    }

    async fn delete_category_if_unused(
        &self,
        name_en: &str,
    ) -> Result<CategoryRemoval, RepoError> {
        let mut tables = self.tables.lock().await;
        if !tables.categories.iter().any(|c| c.name_en == name_en) {
            return Ok(CategoryRemoval::Missing);
        }
        if tables.items.iter().any(|item| item.category == name_en) {
            return Ok(CategoryRemoval::InUse);
        }
        tables.categories.retain(|c| c.name_en != name_en);
        Ok(CategoryRemoval::Removed)
    }

    async fn delete_category(&self, id: i32) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().await;
        let before = tables.categories.len();
        tables.categories.retain(|c| c.id != id);
        if tables.categories.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl MenuRepo for MemoryStore {
    async fn create_item(&self, params: MenuItemParams) -> Result<MenuItemRecord, RepoError> {
        self.check_item_write()?;
        let mut tables = self.tables.lock().await;
        tables.next_item_id += 1;
        let item = MenuItemRecord {
            id: tables.next_item_id,
            title: params.title,
            price: params.price,
            image_urls: params.image_urls,
            calories: params.calories,
            description: params.description,
            category: params.category,
            created_at: params.timestamp,
            updated_at: params.timestamp,
        };
        tables.items.push(item.clone());
        Ok(item)
    }

    async fn find_item(&self, id: i32) -> Result<Option<MenuItemRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.items.iter().find(|item| item.id == id).cloned())
    }

    async fn list_items(&self) -> Result<Vec<MenuItemRecord>, RepoError> {
        self.item_list_queries.fetch_add(1, Ordering::SeqCst);
        let mut items = self.items().await;
        items.sort_by_key(|item| item.id);
        Ok(items)
    }

    async fn list_items_in_category(&self, slug: &str) -> Result<Vec<MenuItemRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .items
            .iter()
            .filter(|item| item.category == slug)
            .cloned()
            .collect())
    }

    async fn update_item(
        &self,
        id: i32,
        params: MenuItemParams,
    ) -> Result<MenuItemRecord, RepoError> {
        self.check_item_write()?;
        let mut tables = self.tables.lock().await;
        let item = tables
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(RepoError::NotFound)?;
        item.title = params.title;
        item.price = params.price;
        item.image_urls = params.image_urls;
        item.calories = params.calories;
        item.description = params.description;
        item.category = params.category;
        item.updated_at = params.timestamp;
        Ok(item.clone())
    }

    async fn delete_item(&self, id: i32) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().await;
        let before = tables.items.len();
        tables.items.retain(|item| item.id != id);
        if tables.items.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl NewsRepo for MemoryStore {
    async fn create_news(&self, params: NewsParams) -> Result<NewsRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        tables.next_news_id += 1;
        let news = NewsRecord {
            id: tables.next_news_id,
            title: params.title,
            preview: params.preview,
            description: params.description,
            image_urls: params.image_urls,
            created_at: params.timestamp,
            updated_at: params.timestamp,
            posted_at: params.posted_at,
        };
        tables.news.push(news.clone());
        Ok(news)
    }

    async fn find_news(&self, id: i32) -> Result<Option<NewsRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.news.iter().find(|news| news.id == id).cloned())
    }

    async fn list_news(&self) -> Result<Vec<NewsRecord>, RepoError> {
        let mut news = self.tables.lock().await.news.clone();
        news.sort_by(|a, b| b.posted_at.cmp(&a.posted_at).then_with(|| b.id.cmp(&a.id)));
        Ok(news)
    }

    async fn update_news(&self, id: i32, params: NewsParams) -> Result<NewsRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let news = tables
            .news
            .iter_mut()
            .find(|news| news.id == id)
            .ok_or(RepoError::NotFound)?;
        news.title = params.title;
        news.preview = params.preview;
        news.description = params.description;
        news.image_urls = params.image_urls;
        news.posted_at = params.posted_at;
        news.updated_at = params.timestamp;
        Ok(news.clone())
    }

    async fn delete_news(&self, id: i32) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().await;
        let before = tables.news.len();
        tables.news.retain(|news| news.id != id);
        if tables.news.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl HealthRepo for MemoryStore {
    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Services and router wired against a [`MemoryStore`] and a temporary upload directory.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub state: HttpState,
    pub router: Router,
    pub uploads: tempfile::TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_cache(CacheConfig::default())
    }

    pub fn with_cache(cache_config: CacheConfig) -> Self {
        let store = Arc::new(MemoryStore::default());
        let uploads = tempfile::tempdir().expect("tempdir");
        let storage =
            Arc::new(UploadStorage::new(uploads.path().to_path_buf()).expect("upload storage"));
        let cache = Arc::new(ReadCache::new(cache_config));

        let categories_repo: Arc<dyn CategoriesRepo> = store.clone();
        let menu_repo: Arc<dyn MenuRepo> = store.clone();
        let news_repo: Arc<dyn NewsRepo> = store.clone();
        let health_repo: Arc<dyn HealthRepo> = store.clone();

        let images = ImageReconciler::new(Arc::clone(&storage), DEFAULT_MAX_IMAGE_BYTES);
        let categories =
            CategoryRegistry::new(categories_repo, Arc::clone(&menu_repo), Arc::clone(&cache));
        let menu = MenuService::new(menu_repo, categories.clone(), images.clone(), cache);
        let news = NewsService::new(news_repo, images);
        let auth = AuthService::new(AuthConfig {
            admin_password: ADMIN_PASSWORD.into(),
            jwt_secret: JWT_SECRET.into(),
            token_ttl: Duration::days(7),
        });

        let state = HttpState {
            menu: Arc::new(menu),
            categories: Arc::new(categories),
            news: Arc::new(news),
            auth: Arc::new(auth),
            uploads: storage,
            health: health_repo,
        };
        let router = http::build_router(state.clone(), DEFAULT_MAX_REQUEST_BYTES);

        Self {
            store,
            state,
            router,
            uploads,
        }
    }

    pub fn admin_token(&self) -> String {
        self.state.auth.login(ADMIN_PASSWORD).expect("token")
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.admin_token())
    }

    pub fn stored_files(&self) -> usize {
        std::fs::read_dir(self.uploads.path())
            .expect("read uploads")
            .count()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get_json(&self, uri: &str) -> (u16, serde_json::Value) {
        let response = self
            .send(Request::get(uri).body(Body::empty()).expect("request"))
            .await;
        read_json(response).await
    }

    /// Send a JSON body with the admin token attached.
    pub async fn admin_json(
        &self,
        method: &str,
        uri: &str,
        body: serde_json::Value,
    ) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, self.bearer())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        self.send(request).await
    }

    pub async fn admin_delete(&self, uri: &str) -> Response<Body> {
        let request = Request::delete(uri)
            .header(header::AUTHORIZATION, self.bearer())
            .body(Body::empty())
            .expect("request");
        self.send(request).await
    }
}

pub async fn read_json(response: Response<Body>) -> (u16, serde_json::Value) {
    let status = response.status().as_u16();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    if bytes.is_empty() {
        return (status, serde_json::Value::Null);
    }
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

pub struct FilePart<'a> {
    pub field: &'a str,
    pub filename: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

const BOUNDARY: &str = "cafe-test-boundary";

/// Encode a `multipart/form-data` body; returns the content type and the bytes.
pub fn multipart_body(fields: &[(&str, &str)], files: &[FilePart<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for file in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.field, file.filename, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}
