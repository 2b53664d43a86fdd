//! Field level checks for the portal forms.
//!
//! Every check is synchronous and local. A [`Validation`] holds one entry per
//! checked field, with an empty message meaning the field passed, so painting
//! it also clears messages left over from an earlier submission.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::view::{RenderTarget, Slot};

lazy_static! {
    static ref EMAIL: Regex = Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern is valid");
}

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Length as the browser's form fields count it, in UTF-16 code units.
fn field_len(value: &str) -> usize {
    value.encode_utf16().count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    FirstName,
    LastName,
    Email,
    Birthdate,
    RegUsername,
    RegPassword,
    Username,
    Password,
    DocType,
    DocFile,
}

impl Field {
    /// Id of the element that displays this field's error.
    pub fn error_slot(self) -> &'static str {
        match self {
            Field::FirstName => "err-firstName",
            Field::LastName => "err-lastName",
            Field::Email => "err-email",
            Field::Birthdate => "err-birthdate",
            Field::RegUsername => "err-reg-username",
            Field::RegPassword => "err-reg-password",
            Field::Username => "err-username",
            Field::Password => "err-password",
            Field::DocType => "err-doc-type",
            Field::DocFile => "err-doc-file",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    fields: Vec<(Field, String)>,
}

impl Validation {
    fn check(&mut self, field: Field, passed: bool, message: &str) {
        let message = if passed { "" } else { message };
        self.fields.push((field, message.to_string()));
    }

    pub fn is_valid(&self) -> bool {
        self.fields.iter().all(|(_, message)| message.is_empty())
    }

    /// Error text for `field`; empty when it passed or was not checked.
    #[cfg(test)]
    pub fn message(&self, field: Field) -> &str {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map_or("", |(_, message)| message.as_str())
    }

    pub fn failed(&self) -> Vec<Field> {
        self.fields
            .iter()
            .filter(|(_, message)| !message.is_empty())
            .map(|(field, _)| *field)
            .collect()
    }

    pub fn paint(&self, target: &mut dyn RenderTarget) {
        for (field, message) in &self.fields {
            target.text(Slot::FieldError(*field), message.clone());
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birthdate: String,
    pub username: String,
    pub password: String,
}

impl RegisterForm {
    /// Trims the free-text fields the way the form reads them.
    pub fn normalized(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            username: self.username.trim().to_string(),
            ..self
        }
    }

    pub fn validate(&self) -> Validation {
        let mut v = Validation::default();
        v.check(Field::FirstName, !self.first_name.is_empty(), "Required");
        v.check(Field::LastName, !self.last_name.is_empty(), "Required");
        v.check(Field::Email, EMAIL.is_match(&self.email), "Enter valid email");
        v.check(Field::Birthdate, !self.birthdate.is_empty(), "Required");
        v.check(Field::RegUsername, field_len(&self.username) >= 4, "Min 4 chars");
        v.check(Field::RegPassword, field_len(&self.password) >= 6, "Min 6 chars");
        v
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            ..self
        }
    }

    // Six characters are required even though the admin demo password is
    // shorter; the admin surface does not go through this check.
    pub fn validate(&self) -> Validation {
        let mut v = Validation::default();
        v.check(Field::Username, !self.username.is_empty(), "Required");
        v.check(
            Field::Password,
            field_len(&self.password) >= 6,
            "Password required (min 6)",
        );
        v
    }
}

/// What the browser reports about a picked file. Contents are never sent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileMeta {
    pub name: String,
    #[serde(rename = "type", default)]
    pub media_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadForm {
    pub doc_type: String,
    /// Text of the selected option.
    pub type_label: String,
    pub file: Option<FileMeta>,
}

impl UploadForm {
    pub fn validate(&self) -> Validation {
        let mut v = Validation::default();
        v.check(Field::DocType, !self.doc_type.is_empty(), "Select a document");
        match &self.file {
            None => v.check(Field::DocFile, false, "Select a PDF file"),
            Some(file) => v.check(
                Field::DocFile,
                file.media_type == PDF_MEDIA_TYPE,
                "Only PDF allowed",
            ),
        }
        v
    }

    pub fn label(&self) -> &str {
        if self.type_label.is_empty() {
            &self.doc_type
        } else {
            &self.type_label
        }
    }
}
