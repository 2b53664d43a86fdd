pub mod auth;
pub mod config;
pub mod err;
pub mod gate;
pub mod io;
pub mod models;
pub mod portal;
pub mod repo;
pub mod store;
pub mod validate;
pub mod view;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::handler::Handler;
use axum::{routing::get, routing::post, Extension, Json, Router};
use mockable::DefaultClock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower::ServiceBuilder;

use crate::config::Config;
use crate::err::{Error, Fine, Maybe};
use crate::portal::Portal;
use crate::store::{MemoryStore, Storage};
use crate::validate::UploadForm;
use crate::view::{ApplicationFilter, View};

pub type Payload<T> = Result<Json<Maybe<T>>, Error>;
pub type SharedHost = Arc<Mutex<Host>>;

pub fn proceeds<V>(value: V) -> Payload<V> where V: Serialize {
    Ok(Json(Fine(value)))
}

/// Stands in for the browser: one portal plus the file its durable scope lives in.
pub struct Host {
    pub portal: Portal,
    snapshot: Option<PathBuf>,
}

impl Host {
    pub fn new(portal: Portal, snapshot: Option<PathBuf>) -> Self {
        Self { portal, snapshot }
    }

    pub async fn persist(&self) -> anyhow::Result<()> {
        match &self.snapshot {
            Some(path) => io::write_snapshot(path, &self.portal.storage().durable.snapshot()).await,
            None => Ok(()),
        }
    }
}

pub fn app(host: SharedHost) -> Router {
    Router::new()
        .route("/pages/:page", get(load_page))
        .route("/student/register", post(auth::register_student))
        .route("/student/login", post(auth::login_student))
        .route("/student/signout", post(auth::sign_out))
        .route("/scholarships/:id/apply", post(apply))
        .route("/applications", get(filter_applications))
        .route("/applications/:id", get(view_application))
        .route("/documents", post(upload_document))
        .route("/admin/login", post(auth::admin_login))
        .route("/admin/logout", post(auth::admin_logout))
        .fallback(err::handler404.into_service())
        .layer(ServiceBuilder::new().layer(Extension(host)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config::from_env()?;
    io::prepare_io(&config.data_dir).await?;

    let snapshot = io::read_snapshot(&config.snapshot_path()).await?;
    let storage = Storage::new(MemoryStore::from_entries(snapshot), MemoryStore::new());
    let mut portal = Portal::new(storage, Arc::new(DefaultClock));
    portal.init();
    let host = Host::new(portal, Some(config.snapshot_path()));
    host.persist().await?;

    let app = app(Arc::new(Mutex::new(host)));
    log::info!("Starting scholarship portal on http://{}", config.addr);
    axum::Server::bind(&config.addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageQuery {
    q: String,
    status: String,
    /// Comma separated hrefs of the page's nav links.
    nav: String,
    /// Free text table search, matched against every cell.
    search: String,
}

async fn load_page(
    Extension(host): Extension<SharedHost>,
    Path(page): Path<String>,
    Query(query): Query<PageQuery>,
) -> Payload<View> {
    let filter = ApplicationFilter {
        q: query.q,
        status: query.status,
    };
    let nav: Vec<String> = query
        .nav
        .split(',')
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect();

    let mut host = host.lock().await;
    let mut view = View::default();
    host.portal.load(&page, &filter, &nav, &mut view);
    if !query.search.is_empty() {
        view.search_tables(&query.search);
    }
    proceeds(view)
}

async fn filter_applications(
    Extension(host): Extension<SharedHost>,
    Query(filter): Query<ApplicationFilter>,
) -> Payload<View> {
    let mut host = host.lock().await;
    let mut view = View::default();
    host.portal.filter_applications(&filter, &mut view);
    proceeds(view)
}

async fn apply(Extension(host): Extension<SharedHost>, Path(id): Path<u32>) -> Payload<View> {
    let mut host = host.lock().await;
    let mut view = View::default();
    host.portal.apply(id, &mut view)?;
    host.persist().await.map_err(Error::from)?;
    proceeds(view)
}

async fn view_application(
    Extension(host): Extension<SharedHost>,
    Path(id): Path<u32>,
) -> Payload<View> {
    let mut host = host.lock().await;
    let mut view = View::default();
    host.portal.view_application(id, &mut view);
    proceeds(view)
}

async fn upload_document(
    Extension(host): Extension<SharedHost>,
    Json(form): Json<UploadForm>,
) -> Payload<View> {
    let mut host = host.lock().await;
    let mut view = View::default();
    host.portal.upload(form, &mut view)?;
    host.persist().await.map_err(Error::from)?;
    proceeds(view)
}
