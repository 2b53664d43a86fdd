use crate::repo::SESSION_KEY;
use crate::store::{Storage, Store};
use crate::view::RenderTarget;

pub const ADMIN_FLAG_KEY: &str = "loggedIn";
const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "123";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Student,
    Admin,
}

impl Surface {
    pub fn of(page: &str) -> Self {
        if page.starts_with("student-") {
            Surface::Student
        } else {
            Surface::Admin
        }
    }

    pub fn public_pages(self) -> &'static [&'static str] {
        match self {
            Surface::Student => &["student-login.html", "student-register.html"],
            Surface::Admin => &["login.html", "register.html"],
        }
    }

    pub fn login_page(self) -> &'static str {
        match self {
            Surface::Student => "student-login.html",
            Surface::Admin => "login.html",
        }
    }

    fn has_marker(self, storage: &Storage) -> bool {
        match self {
            Surface::Student => storage.session.get_raw(SESSION_KEY).is_some(),
            Surface::Admin => AdminGate::is_logged_in(storage.durable.as_ref()),
        }
    }
}

/// File name part of a request path, e.g. `student-dashboard.html`.
pub fn page_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(&'static str),
}

pub fn check(page: &str, storage: &Storage) -> Decision {
    let surface = Surface::of(page);
    if surface.public_pages().contains(&page) {
        return Decision::Allow;
    }
    require(surface, storage)
}

/// Gate for work that belongs to `surface` but is not a page load.
pub fn require(surface: Surface, storage: &Storage) -> Decision {
    if surface.has_marker(storage) {
        Decision::Allow
    } else {
        log::debug!("No {:?} session, redirecting", surface);
        Decision::Redirect(surface.login_page())
    }
}

/// Marks the nav link pointing at `current` as active and clears the rest.
pub fn highlight_nav<S: AsRef<str>>(target: &mut dyn RenderTarget, current: &str, hrefs: &[S]) {
    for href in hrefs {
        let href = href.as_ref();
        target.highlight(href, href == current);
    }
}

/// Literal credential check for the admin pages, backed by a durable flag.
pub struct AdminGate<'a> {
    durable: &'a mut dyn Store,
}

impl<'a> AdminGate<'a> {
    pub fn new(durable: &'a mut dyn Store) -> Self {
        Self { durable }
    }

    pub fn is_logged_in(durable: &dyn Store) -> bool {
        durable
            .get_raw(ADMIN_FLAG_KEY)
            .map_or(false, |flag| !flag.is_empty())
    }

    pub fn login(&mut self, username: &str, password: &str) -> bool {
        if username != ADMIN_USERNAME || password != ADMIN_PASSWORD {
            return false;
        }
        self.durable.set_raw(ADMIN_FLAG_KEY, "true".to_string());
        true
    }

    pub fn logout(&mut self) {
        self.durable.remove(ADMIN_FLAG_KEY);
    }
}
