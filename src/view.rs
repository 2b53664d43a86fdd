//! Rendering of portal state into named display slots.
//!
//! Renderers never touch a document tree directly. They write through a
//! [`RenderTarget`], and every write replaces the whole slot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Application, Document, SCHOLARSHIPS};
use crate::validate::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    StudentName,
    TotalScholarships,
    ApplicationsCount,
    DocumentsCount,
    ScholarshipList,
    ApplicationsTable,
    SubmittedList,
    AdminError,
    FieldError(Field),
}

impl Slot {
    pub fn id(self) -> &'static str {
        match self {
            Slot::StudentName => "student-name",
            Slot::TotalScholarships => "total-scholarships",
            Slot::ApplicationsCount => "my-applications-count",
            Slot::DocumentsCount => "submitted-docs-count",
            Slot::ScholarshipList => "scholarship-list",
            Slot::ApplicationsTable => "applications-table",
            Slot::SubmittedList => "submitted-list",
            Slot::AdminError => "errorMsg",
            Slot::FieldError(field) => field.error_slot(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "id")]
pub enum Action {
    Apply(u32),
    View(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub cells: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

pub trait RenderTarget {
    fn text(&mut self, slot: Slot, text: String);
    fn rows(&mut self, slot: Slot, rows: Vec<Row>);
    fn alert(&mut self, message: String);
    fn redirect(&mut self, page: &str);
    fn highlight(&mut self, href: &str, active: bool);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SlotContent {
    Text(String),
    Rows(Vec<Row>),
}

/// Serializable result of one interaction, handed back to the page shell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct View {
    pub slots: BTreeMap<&'static str, SlotContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub nav: BTreeMap<String, bool>,
}

#[cfg(test)]
impl View {
    pub fn text_of(&self, slot: Slot) -> Option<&str> {
        match self.slots.get(slot.id()) {
            Some(SlotContent::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn rows_of(&self, slot: Slot) -> Option<&[Row]> {
        match self.slots.get(slot.id()) {
            Some(SlotContent::Rows(rows)) => Some(rows),
            _ => None,
        }
    }
}

impl View {
    /// Applies the generic table search to every rendered table.
    pub fn search_tables(&mut self, query: &str) {
        for content in self.slots.values_mut() {
            if let SlotContent::Rows(rows) = content {
                *rows = filter_rows(std::mem::take(rows), query);
            }
        }
    }
}

impl RenderTarget for View {
    fn text(&mut self, slot: Slot, text: String) {
        self.slots.insert(slot.id(), SlotContent::Text(text));
    }

    fn rows(&mut self, slot: Slot, rows: Vec<Row>) {
        self.slots.insert(slot.id(), SlotContent::Rows(rows));
    }

    fn alert(&mut self, message: String) {
        self.alerts.push(message);
    }

    fn redirect(&mut self, page: &str) {
        self.redirect = Some(page.to_string());
    }

    fn highlight(&mut self, href: &str, active: bool) {
        self.nav.insert(href.to_string(), active);
    }
}

pub fn paint_counts(target: &mut dyn RenderTarget, applications: usize, documents: usize) {
    target.text(Slot::TotalScholarships, SCHOLARSHIPS.len().to_string());
    target.text(Slot::ApplicationsCount, applications.to_string());
    target.text(Slot::DocumentsCount, documents.to_string());
}

pub fn scholarship_rows() -> Vec<Row> {
    SCHOLARSHIPS
        .iter()
        .map(|s| Row {
            cells: vec![s.title.to_string(), format!("Deadline: {}", s.deadline)],
            action: Some(Action::Apply(s.id)),
        })
        .collect()
}

/// Search box and status dropdown of the applications table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApplicationFilter {
    pub q: String,
    pub status: String,
}

impl ApplicationFilter {
    pub fn matches(&self, app: &Application) -> bool {
        if !self.status.is_empty() && app.status.as_str() != self.status {
            return false;
        }
        let q = self.q.trim().to_lowercase();
        q.is_empty()
            || app.app_id.to_string().contains(&q)
            || app.scholarship.to_lowercase().contains(&q)
            || app.status.as_str().to_lowercase().contains(&q)
    }
}

pub fn application_rows(apps: &[Application], filter: &ApplicationFilter) -> Vec<Row> {
    apps.iter()
        .filter(|a| filter.matches(a))
        .map(|a| Row {
            cells: vec![
                a.app_id.to_string(),
                a.scholarship.clone(),
                a.date.to_string(),
                a.status.as_str().to_string(),
            ],
            action: Some(Action::View(a.app_id)),
        })
        .collect()
}

pub fn document_rows(docs: &[Document]) -> Vec<Row> {
    docs.iter()
        .map(|d| Row {
            cells: vec![
                d.type_label.clone(),
                d.file_name.clone(),
                format!("Status: {}", d.status.as_str()),
            ],
            action: None,
        })
        .collect()
}

/// Keeps rows where any cell contains `query`, ignoring case.
pub fn filter_rows(rows: Vec<Row>, query: &str) -> Vec<Row> {
    let query = query.to_lowercase();
    rows.into_iter()
        .filter(|row| row.cells.iter().any(|c| c.to_lowercase().contains(&query)))
        .collect()
}
