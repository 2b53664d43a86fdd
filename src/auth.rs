use axum::{Extension, Json};
use serde::Deserialize;

use crate::err::Error;
use crate::validate::{LoginForm, RegisterForm};
use crate::view::View;
use crate::{proceeds, Payload, SharedHost};

pub async fn register_student(
    Extension(host): Extension<SharedHost>,
    Json(form): Json<RegisterForm>,
) -> Payload<View> {
    let mut host = host.lock().await;
    let mut view = View::default();
    host.portal.register(form, &mut view)?;
    host.persist().await.map_err(Error::from)?;
    proceeds(view)
}

pub async fn login_student(
    Extension(host): Extension<SharedHost>,
    Json(form): Json<LoginForm>,
) -> Payload<View> {
    let mut host = host.lock().await;
    let mut view = View::default();
    host.portal.login(form, &mut view)?;
    proceeds(view)
}

pub async fn sign_out(Extension(host): Extension<SharedHost>) -> Payload<View> {
    let mut host = host.lock().await;
    let mut view = View::default();
    host.portal.sign_out(&mut view);
    proceeds(view)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminLogin {
    pub username: String,
    pub password: String,
}

pub async fn admin_login(
    Extension(host): Extension<SharedHost>,
    Json(login): Json<AdminLogin>,
) -> Payload<View> {
    let mut host = host.lock().await;
    let mut view = View::default();
    host.portal
        .admin_login(&login.username, &login.password, &mut view);
    host.persist().await.map_err(Error::from)?;
    proceeds(view)
}

pub async fn admin_logout(Extension(host): Extension<SharedHost>) -> Payload<View> {
    let mut host = host.lock().await;
    let mut view = View::default();
    host.portal.admin_logout(&mut view);
    host.persist().await.map_err(Error::from)?;
    proceeds(view)
}
