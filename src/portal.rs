use std::sync::Arc;

use mockable::Clock;

use crate::err::Error;
use crate::gate::{self, AdminGate, Decision, Surface};
use crate::models::{find_scholarship, Document, RegisteredUser, Status};
use crate::repo::{Accounts, Applications, Documents};
use crate::store::Storage;
use crate::validate::{LoginForm, RegisterForm, UploadForm};
use crate::view::{self, ApplicationFilter, RenderTarget, Slot};

pub type SharedClock = Arc<dyn Clock + Send + Sync>;

pub const DASHBOARD_PAGE: &str = "student-dashboard.html";
pub const APPLICATIONS_PAGE: &str = "student-applications.html";
pub const DOCUMENTS_PAGE: &str = "student-documents.html";
pub const STUDENT_LOGIN_PAGE: &str = "student-login.html";
pub const ADMIN_HOME_PAGE: &str = "index.html";
pub const ADMIN_LOGIN_PAGE: &str = "login.html";

/// One browser's worth of portal state. Every method is a single user
/// interaction: read the stores, maybe write them back, then paint `target`.
pub struct Portal {
    storage: Storage,
    clock: SharedClock,
}

impl Portal {
    pub fn new(storage: Storage, clock: SharedClock) -> Self {
        Self { storage, clock }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Startup step, run once before the first page load.
    pub fn init(&mut self) {
        Applications::new(self.storage.durable.as_mut()).ensure_seeded();
    }

    pub fn load(
        &mut self,
        path: &str,
        filter: &ApplicationFilter,
        nav: &[String],
        target: &mut dyn RenderTarget,
    ) {
        let page = gate::page_name(path);
        if let Decision::Redirect(login) = gate::check(page, &self.storage) {
            target.redirect(login);
            return;
        }
        gate::highlight_nav(target, page, nav);

        match page {
            DASHBOARD_PAGE => self.render_dashboard(target),
            APPLICATIONS_PAGE => self.filter_applications(filter, target),
            DOCUMENTS_PAGE => self.render_documents(target),
            _ => {}
        }
    }

    /// Student actions outside a page load pass the same gate as the pages.
    fn student_session(&self, target: &mut dyn RenderTarget) -> bool {
        match gate::require(Surface::Student, &self.storage) {
            Decision::Allow => true,
            Decision::Redirect(login) => {
                target.redirect(login);
                false
            }
        }
    }

    fn render_dashboard(&mut self, target: &mut dyn RenderTarget) {
        let name = Accounts::new(self.storage.durable.as_mut(), self.storage.session.as_mut())
            .display_name();
        target.text(Slot::StudentName, name);
        self.paint_counts(target);
        target.rows(Slot::ScholarshipList, view::scholarship_rows());
    }

    fn render_documents(&mut self, target: &mut dyn RenderTarget) {
        let docs = Documents::new(self.storage.durable.as_mut()).list_all();
        target.rows(Slot::SubmittedList, view::document_rows(&docs));
    }

    fn paint_counts(&mut self, target: &mut dyn RenderTarget) {
        let apps = Applications::new(self.storage.durable.as_mut()).list_all().len();
        let docs = Documents::new(self.storage.durable.as_mut()).list_all().len();
        view::paint_counts(target, apps, docs);
    }

    /// Re-renders the applications table for the current search and status.
    pub fn filter_applications(&mut self, filter: &ApplicationFilter, target: &mut dyn RenderTarget) {
        if !self.student_session(target) {
            return;
        }
        let apps = Applications::new(self.storage.durable.as_mut()).list_all();
        target.rows(Slot::ApplicationsTable, view::application_rows(&apps, filter));
    }

    pub fn register(&mut self, form: RegisterForm, target: &mut dyn RenderTarget) -> Result<(), Error> {
        let form = form.normalized();
        let validation = form.validate();
        validation.paint(target);
        if !validation.is_valid() {
            log::debug!("Form rejected on {:?}", validation.failed());
            return Ok(());
        }

        let user = RegisteredUser {
            first_name: form.first_name,
            last_name: form.last_name,
            email: form.email,
            birthdate: form.birthdate,
            username: form.username,
        };
        Accounts::new(self.storage.durable.as_mut(), self.storage.session.as_mut())
            .register(&user)?;
        log::info!("Registered student `{}`", user.username);

        target.alert("Account created (client-only). You can now sign in.".to_string());
        target.redirect(STUDENT_LOGIN_PAGE);
        Ok(())
    }

    pub fn login(&mut self, form: LoginForm, target: &mut dyn RenderTarget) -> Result<(), Error> {
        let form = form.normalized();
        let validation = form.validate();
        validation.paint(target);
        if !validation.is_valid() {
            log::debug!("Form rejected on {:?}", validation.failed());
            return Ok(());
        }

        let mut accounts =
            Accounts::new(self.storage.durable.as_mut(), self.storage.session.as_mut());
        if let Some(user) = accounts.registered_user() {
            if user.username != form.username {
                log::debug!(
                    "`{}` differs from registered `{}`, allowing anyway",
                    form.username,
                    user.username
                );
            }
        }
        accounts.start_session(&form.username)?;
        log::info!("Student `{}` signed in", form.username);

        target.redirect(DASHBOARD_PAGE);
        Ok(())
    }

    pub fn sign_out(&mut self, target: &mut dyn RenderTarget) {
        Accounts::new(self.storage.durable.as_mut(), self.storage.session.as_mut()).end_session();
        log::info!("Student signed out");
        target.redirect(STUDENT_LOGIN_PAGE);
    }

    pub fn apply(&mut self, scholarship_id: u32, target: &mut dyn RenderTarget) -> Result<(), Error> {
        if !self.student_session(target) {
            return Ok(());
        }
        let scholarship = match find_scholarship(scholarship_id) {
            Some(s) => s,
            None => {
                log::debug!("Ignoring apply for unknown scholarship {}", scholarship_id);
                return Ok(());
            }
        };

        let today = self.clock.utc().date_naive();
        let app = Applications::new(self.storage.durable.as_mut()).append(
            scholarship.title,
            today,
            Status::Pending,
        )?;
        log::info!("Application {} created for `{}`", app.app_id, app.scholarship);

        target.alert("Application submitted (client-only).".to_string());
        self.paint_counts(target);
        Ok(())
    }

    pub fn view_application(&mut self, app_id: u32, target: &mut dyn RenderTarget) {
        if !self.student_session(target) {
            return;
        }
        let app = match Applications::new(self.storage.durable.as_mut()).find(app_id) {
            Some(app) => app,
            None => return,
        };
        target.alert(format!(
            "Application {}\nScholarship: {}\nDate: {}\nStatus: {}",
            app.app_id,
            app.scholarship,
            app.date,
            app.status.as_str()
        ));
    }

    pub fn upload(&mut self, form: UploadForm, target: &mut dyn RenderTarget) -> Result<(), Error> {
        if !self.student_session(target) {
            return Ok(());
        }
        let validation = form.validate();
        validation.paint(target);
        let file = match (&form.file, validation.is_valid()) {
            (Some(file), true) => file,
            _ => {
                log::debug!("Upload rejected on {:?}", validation.failed());
                return Ok(());
            }
        };

        let document = Document {
            kind: form.doc_type.clone(),
            type_label: form.label().to_string(),
            file_name: file.name.clone(),
            status: Status::Pending,
            uploaded_at: self.clock.utc(),
        };
        Documents::new(self.storage.durable.as_mut()).append(document)?;
        log::info!("Document `{}` uploaded as `{}`", file.name, form.doc_type);

        target.alert("Document uploaded (client-only).".to_string());
        self.render_documents(target);
        self.paint_counts(target);
        Ok(())
    }

    pub fn admin_login(&mut self, username: &str, password: &str, target: &mut dyn RenderTarget) {
        if AdminGate::new(self.storage.durable.as_mut()).login(username, password) {
            log::info!("Admin signed in");
            target.redirect(ADMIN_HOME_PAGE);
        } else {
            target.text(Slot::AdminError, "Invalid username or password".to_string());
        }
    }

    pub fn admin_logout(&mut self, target: &mut dyn RenderTarget) {
        AdminGate::new(self.storage.durable.as_mut()).logout();
        target.redirect(ADMIN_LOGIN_PAGE);
    }
}

#[cfg(test)]
pub struct FixedClock(pub chrono::DateTime<chrono::Utc>);

#[cfg(test)]
impl Clock for FixedClock {
    fn local(&self) -> chrono::DateTime<chrono::Local> {
        self.0.with_timezone(&chrono::Local)
    }

    fn utc(&self) -> chrono::DateTime<chrono::Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use crate::repo::APPS_KEY;
    use crate::store::Store;
    use crate::validate::{Field, FileMeta};
    use crate::view::{Action, View};

    fn fixed_now() -> DateTime<Utc> {
        "2026-10-19T09:30:00Z".parse().unwrap()
    }

    fn clock() -> SharedClock {
        Arc::new(FixedClock(fixed_now()))
    }

    fn portal() -> Portal {
        let mut portal = Portal::new(Storage::in_memory(), clock());
        portal.init();
        portal
    }

    fn empty_portal() -> Portal {
        let mut storage = Storage::in_memory();
        storage.durable.set_raw(APPS_KEY, "[]".to_string());
        Portal::new(storage, clock())
    }

    fn signed_in(mut portal: Portal) -> Portal {
        let form = LoginForm {
            username: "jdoe".to_string(),
            password: "secret1".to_string(),
        };
        portal.login(form, &mut View::default()).unwrap();
        portal
    }

    fn apps(portal: &mut Portal) -> Vec<crate::models::Application> {
        Applications::new(portal.storage.durable.as_mut()).list_all()
    }

    fn upload_form(media_type: &str) -> UploadForm {
        UploadForm {
            doc_type: "grades".to_string(),
            type_label: "Report Card".to_string(),
            file: Some(FileMeta {
                name: "grades.pdf".to_string(),
                media_type: media_type.to_string(),
            }),
        }
    }

    #[test]
    fn protected_pages_redirect_before_rendering() {
        let mut portal = portal();
        let mut view = View::default();
        portal.load("/student-dashboard.html", &ApplicationFilter::default(), &[], &mut view);
        assert_eq!(view.redirect.as_deref(), Some("student-login.html"));
        assert!(view.slots.is_empty());
    }

    #[test]
    fn student_actions_without_a_session_redirect_and_change_nothing() {
        let mut portal = portal();
        let before = portal.storage().durable.snapshot();

        let mut view = View::default();
        portal.apply(101, &mut view).unwrap();
        assert_eq!(view.redirect.as_deref(), Some(STUDENT_LOGIN_PAGE));
        assert!(view.slots.is_empty() && view.alerts.is_empty());

        let mut view = View::default();
        portal.upload(upload_form("application/pdf"), &mut view).unwrap();
        assert_eq!(view.redirect.as_deref(), Some(STUDENT_LOGIN_PAGE));
        assert!(view.slots.is_empty() && view.alerts.is_empty());

        let mut view = View::default();
        portal.filter_applications(&ApplicationFilter::default(), &mut view);
        assert_eq!(view.redirect.as_deref(), Some(STUDENT_LOGIN_PAGE));
        assert!(view.slots.is_empty());

        let mut view = View::default();
        portal.view_application(2001, &mut view);
        assert_eq!(view.redirect.as_deref(), Some(STUDENT_LOGIN_PAGE));
        assert!(view.alerts.is_empty());

        assert_eq!(portal.storage().durable.snapshot(), before);
    }

    #[test]
    fn admin_flag_does_not_open_student_actions() {
        let mut portal = portal();
        portal.admin_login("admin", "123", &mut View::default());
        let mut view = View::default();
        portal.apply(101, &mut view).unwrap();
        assert_eq!(view.redirect.as_deref(), Some(STUDENT_LOGIN_PAGE));
        assert_eq!(apps(&mut portal).len(), 2);
    }

    #[test]
    fn dashboard_shows_counts_and_catalogue() {
        let mut portal = signed_in(portal());
        let mut view = View::default();
        let nav = vec![DASHBOARD_PAGE.to_string(), DOCUMENTS_PAGE.to_string()];
        portal.load(DASHBOARD_PAGE, &ApplicationFilter::default(), &nav, &mut view);

        assert_eq!(view.redirect, None);
        assert_eq!(view.text_of(Slot::StudentName), Some("jdoe"));
        assert_eq!(view.text_of(Slot::TotalScholarships), Some("3"));
        assert_eq!(view.text_of(Slot::ApplicationsCount), Some("2"));
        assert_eq!(view.text_of(Slot::DocumentsCount), Some("0"));
        assert_eq!(view.rows_of(Slot::ScholarshipList).map(<[_]>::len), Some(3));
        assert_eq!(view.nav.get(DASHBOARD_PAGE), Some(&true));
        assert_eq!(view.nav.get(DOCUMENTS_PAGE), Some(&false));
    }

    #[test]
    fn applying_assigns_consecutive_ids_from_2001() {
        let mut portal = signed_in(empty_portal());
        let mut view = View::default();
        portal.apply(101, &mut view).unwrap();
        portal.apply(101, &mut view).unwrap();

        let apps = apps(&mut portal);
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].app_id, 2001);
        assert_eq!(apps[1].app_id, 2002);
        assert_eq!(apps[0].scholarship, "Mayor Liza Scholarship");
        assert_eq!(apps[0].status, Status::Pending);
        assert_eq!(apps[0].date, fixed_now().date_naive());
        assert_eq!(view.text_of(Slot::ApplicationsCount), Some("2"));
        assert_eq!(view.alerts.len(), 2);
    }

    #[test]
    fn applying_after_seed_continues_numbering() {
        let mut portal = signed_in(portal());
        for _ in 0..3 {
            portal.apply(103, &mut View::default()).unwrap();
        }
        let ids: Vec<u32> = apps(&mut portal).iter().map(|a| a.app_id).collect();
        assert_eq!(ids, vec![2001, 2002, 2003, 2004, 2005]);
    }

    #[test]
    fn unknown_scholarship_is_a_no_op() {
        let mut portal = signed_in(empty_portal());
        let mut view = View::default();
        portal.apply(999, &mut view).unwrap();
        assert!(apps(&mut portal).is_empty());
        assert_eq!(view, View::default());
    }

    #[test]
    fn applications_page_filters() {
        let mut portal = signed_in(portal());
        let filter = ApplicationFilter {
            q: String::new(),
            status: "Approved".to_string(),
        };
        let mut view = View::default();
        portal.load(APPLICATIONS_PAGE, &filter, &[], &mut view);
        let rows = view.rows_of(Slot::ApplicationsTable).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].action, Some(Action::View(2002)));
    }

    #[test]
    fn viewing_applications() {
        let mut portal = signed_in(portal());
        let mut view = View::default();
        portal.view_application(2002, &mut view);
        assert_eq!(
            view.alerts,
            vec!["Application 2002\nScholarship: Athlete Scholarship\nDate: 2025-08-22\nStatus: Approved"]
        );

        let mut view = View::default();
        portal.view_application(4242, &mut view);
        assert!(view.alerts.is_empty());
    }

    #[test]
    fn non_pdf_upload_is_rejected_without_writing() {
        let mut portal = signed_in(portal());
        let mut view = View::default();
        portal.upload(upload_form("image/png"), &mut view).unwrap();
        assert_eq!(
            view.text_of(Slot::FieldError(Field::DocFile)),
            Some("Only PDF allowed")
        );
        assert!(Documents::new(portal.storage.durable.as_mut()).list_all().is_empty());
        assert!(view.alerts.is_empty());
    }

    #[test]
    fn pdf_upload_appends_one_pending_document() {
        let mut portal = signed_in(portal());
        let mut view = View::default();
        portal.upload(upload_form("application/pdf"), &mut view).unwrap();

        let docs = Documents::new(portal.storage.durable.as_mut()).list_all();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].status, Status::Pending);
        assert_eq!(docs[0].type_label, "Report Card");
        assert_eq!(docs[0].uploaded_at, fixed_now());
        assert_eq!(view.text_of(Slot::FieldError(Field::DocFile)), Some(""));
        assert_eq!(view.text_of(Slot::DocumentsCount), Some("1"));
        let rows = view.rows_of(Slot::SubmittedList).unwrap();
        assert_eq!(rows[0].cells, vec!["Report Card", "grades.pdf", "Status: Pending"]);
    }

    #[test]
    fn registration_blocks_on_the_failing_field_only() {
        let mut portal = portal();
        let mut view = View::default();
        let form = RegisterForm {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "not-an-email".to_string(),
            birthdate: "2004-05-06".to_string(),
            username: "jdoe".to_string(),
            password: "secret1".to_string(),
        };
        portal.register(form.clone(), &mut view).unwrap();
        assert_eq!(view.text_of(Slot::FieldError(Field::Email)), Some("Enter valid email"));
        let passing = [
            Field::FirstName,
            Field::LastName,
            Field::Birthdate,
            Field::RegUsername,
            Field::RegPassword,
        ];
        for field in passing {
            assert_eq!(view.text_of(Slot::FieldError(field)), Some(""));
        }
        assert_eq!(view.redirect, None);

        let mut view = View::default();
        portal
            .register(
                RegisterForm {
                    email: "jane@example.com".to_string(),
                    ..form
                },
                &mut view,
            )
            .unwrap();
        assert_eq!(view.text_of(Slot::FieldError(Field::Email)), Some(""));
        assert_eq!(view.redirect.as_deref(), Some(STUDENT_LOGIN_PAGE));

        let mut portal = signed_in(portal);
        let mut view = View::default();
        portal.load(DASHBOARD_PAGE, &ApplicationFilter::default(), &[], &mut view);
        assert_eq!(view.text_of(Slot::StudentName), Some("Jane"));
    }

    #[test]
    fn short_login_password_is_refused() {
        let mut portal = portal();
        let mut view = View::default();
        let form = LoginForm {
            username: "admin".to_string(),
            password: "123".to_string(),
        };
        portal.login(form, &mut view).unwrap();
        assert_eq!(
            view.text_of(Slot::FieldError(Field::Password)),
            Some("Password required (min 6)")
        );
        assert_eq!(view.redirect, None);
        assert_eq!(
            gate::check(DASHBOARD_PAGE, portal.storage()),
            Decision::Redirect(STUDENT_LOGIN_PAGE)
        );
    }

    #[test]
    fn sign_out_closes_the_student_pages() {
        let mut portal = signed_in(portal());
        assert_eq!(gate::check(DASHBOARD_PAGE, portal.storage()), Decision::Allow);
        let mut view = View::default();
        portal.sign_out(&mut view);
        assert_eq!(view.redirect.as_deref(), Some(STUDENT_LOGIN_PAGE));
        assert_eq!(
            gate::check(DASHBOARD_PAGE, portal.storage()),
            Decision::Redirect(STUDENT_LOGIN_PAGE)
        );
    }

    #[test]
    fn admin_surface_round_trip() {
        let mut portal = portal();
        let mut view = View::default();
        portal.admin_login("admin", "wrong", &mut view);
        assert_eq!(view.text_of(Slot::AdminError), Some("Invalid username or password"));

        let mut view = View::default();
        portal.admin_login("admin", "123", &mut view);
        assert_eq!(view.redirect.as_deref(), Some(ADMIN_HOME_PAGE));
        assert_eq!(gate::check(ADMIN_HOME_PAGE, portal.storage()), Decision::Allow);

        portal.admin_logout(&mut View::default());
        assert_eq!(
            gate::check(ADMIN_HOME_PAGE, portal.storage()),
            Decision::Redirect(ADMIN_LOGIN_PAGE)
        );
    }
}
