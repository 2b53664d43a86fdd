use chrono::NaiveDate;
use serde_json::Value;

use crate::err::Error;
use crate::models::{Application, Document, RegisteredUser, Status, StudentSession};
use crate::store::{self, Store};

pub const USER_KEY: &str = "sms_student_user";
pub const APPS_KEY: &str = "sms_student_apps";
pub const DOCS_KEY: &str = "sms_student_docs";
pub const SESSION_KEY: &str = "sms_student_session";

pub const FIRST_APP_ID: u32 = 2001;

/// Applications, kept in the durable scope in insertion order.
pub struct Applications<'a> {
    store: &'a mut dyn Store,
}

impl<'a> Applications<'a> {
    pub fn new(store: &'a mut dyn Store) -> Self {
        Self { store }
    }

    pub fn list_all(&self) -> Vec<Application> {
        store::get_list(&*self.store, APPS_KEY)
    }

    pub fn find(&self, app_id: u32) -> Option<Application> {
        self.list_all().into_iter().find(|a| a.app_id == app_id)
    }

    /// Appends a new application, assigning it the next free id. Ids of
    /// stored records that no longer decode still count.
    pub fn append(
        &mut self,
        scholarship: &str,
        date: NaiveDate,
        status: Status,
    ) -> Result<Application, Error> {
        let mut items = store::raw_list(&*self.store, APPS_KEY)?;
        let app_id = next_app_id(
            items
                .iter()
                .filter_map(|item| item.get("appId").and_then(Value::as_u64)),
        )?;
        let app = Application {
            app_id,
            scholarship: scholarship.to_string(),
            date,
            status,
        };
        items.push(serde_json::to_value(&app)?);
        store::set(&mut *self.store, APPS_KEY, &items)?;
        Ok(app)
    }

    /// Writes the sample applications if the collection has never been stored.
    /// Returns whether anything was written.
    pub fn ensure_seeded(&mut self) -> bool {
        if self.store.get_raw(APPS_KEY).is_some() {
            return false;
        }
        self.store.set_raw(APPS_KEY, SEED_APPLICATIONS.to_string());
        log::info!("Seeded sample applications");
        true
    }
}

pub fn next_app_id<I: IntoIterator<Item = u64>>(ids: I) -> Result<u32, Error> {
    let next = match ids.into_iter().max() {
        Some(max) => max.checked_add(1).and_then(|id| u32::try_from(id).ok()),
        None => Some(FIRST_APP_ID),
    };
    next.ok_or_else(|| Error::InternalError {
        kind: "IdExhausted",
        message: "no application id follows the largest stored one".to_string(),
    })
}

const SEED_APPLICATIONS: &str = r#"[
    {"appId":2001,"scholarship":"Mayor Liza Scholarship","date":"2025-10-05","status":"Pending"},
    {"appId":2002,"scholarship":"Athlete Scholarship","date":"2025-08-22","status":"Approved"}
]"#;

/// Uploaded document records. Documents have no seed.
pub struct Documents<'a> {
    store: &'a mut dyn Store,
}

impl<'a> Documents<'a> {
    pub fn new(store: &'a mut dyn Store) -> Self {
        Self { store }
    }

    pub fn list_all(&self) -> Vec<Document> {
        store::get_list(&*self.store, DOCS_KEY)
    }

    pub fn append(&mut self, document: Document) -> Result<Document, Error> {
        store::append(&mut *self.store, DOCS_KEY, &document)?;
        Ok(document)
    }
}

/// The single registered user (durable) and the student session (session scope).
pub struct Accounts<'a> {
    durable: &'a mut dyn Store,
    session: &'a mut dyn Store,
}

impl<'a> Accounts<'a> {
    pub fn new(durable: &'a mut dyn Store, session: &'a mut dyn Store) -> Self {
        Self { durable, session }
    }

    pub fn registered_user(&self) -> Option<RegisteredUser> {
        store::get(&*self.durable, USER_KEY)
    }

    /// Replaces any previously registered user.
    pub fn register(&mut self, user: &RegisteredUser) -> Result<(), Error> {
        store::set(&mut *self.durable, USER_KEY, user)
    }

    pub fn session(&self) -> Option<StudentSession> {
        store::get(&*self.session, SESSION_KEY)
    }

    pub fn start_session(&mut self, username: &str) -> Result<(), Error> {
        let session = StudentSession {
            username: username.to_string(),
        };
        store::set(&mut *self.session, SESSION_KEY, &session)
    }

    pub fn end_session(&mut self) {
        self.session.remove(SESSION_KEY);
    }

    pub fn display_name(&self) -> String {
        if let Some(user) = self.registered_user().filter(|u| !u.first_name.is_empty()) {
            return user.first_name;
        }
        match self.session() {
            Some(session) if !session.username.is_empty() => session.username,
            _ => "Student".to_string(),
        }
    }
}
