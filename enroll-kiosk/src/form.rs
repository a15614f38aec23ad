//! Enrollment Form Model
//!
//! Holds the four identity fields, autofills name and program from the
//! Roster Index whenever the registration id changes, and validates.
//!
//! Autofill rule: on every registration id change, `nome` and `curso` are
//! recomputed. A roster hit copies the record's values; a miss clears both,
//! even if they were typed by hand. The registration id itself is kept.

use enroll_common::programs::{is_known_program, DEFAULT_PROGRAM};
use enroll_common::RosterIndex;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

static FULL_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{Alphabetic}\s]{1,50}$").expect("valid name pattern"));
static TAX_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{3}\.[0-9]{3}\.[0-9]{3}-[0-9]{2}$").expect("valid tax id pattern"));
static REGISTRATION_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{6}$").expect("valid registration id pattern"));

/// Error-set key for the missing still image
pub const IMAGE_KEY: &str = "imagem";

/// Editable form fields, by their wire names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldName {
    #[serde(rename = "nome")]
    FullName,
    #[serde(rename = "cpf")]
    TaxId,
    #[serde(rename = "matricula")]
    RegistrationId,
    #[serde(rename = "curso")]
    Program,
}

impl FieldName {
    pub const ALL: [FieldName; 4] = [
        FieldName::FullName,
        FieldName::TaxId,
        FieldName::RegistrationId,
        FieldName::Program,
    ];

    /// Name used in the multipart payload and the error set
    pub fn wire_name(&self) -> &'static str {
        match self {
            FieldName::FullName => "nome",
            FieldName::TaxId => "cpf",
            FieldName::RegistrationId => "matricula",
            FieldName::Program => "curso",
        }
    }
}

impl FromStr for FieldName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldName::ALL
            .into_iter()
            .find(|f| f.wire_name() == s)
            .ok_or_else(|| format!("unknown form field: {}", s))
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// Current field values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFields {
    #[serde(rename = "nome")]
    pub full_name: String,
    #[serde(rename = "cpf")]
    pub tax_id: String,
    #[serde(rename = "matricula")]
    pub registration_id: String,
    #[serde(rename = "curso")]
    pub program: String,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            tax_id: String::new(),
            registration_id: String::new(),
            program: DEFAULT_PROGRAM.to_string(),
        }
    }
}

impl FormFields {
    pub fn get(&self, name: FieldName) -> &str {
        match name {
            FieldName::FullName => &self.full_name,
            FieldName::TaxId => &self.tax_id,
            FieldName::RegistrationId => &self.registration_id,
            FieldName::Program => &self.program,
        }
    }

    fn slot(&mut self, name: FieldName) -> &mut String {
        match name {
            FieldName::FullName => &mut self.full_name,
            FieldName::TaxId => &mut self.tax_id,
            FieldName::RegistrationId => &mut self.registration_id,
            FieldName::Program => &mut self.program,
        }
    }
}

/// Field → message map; a field absent from the set is valid
///
/// Always recomputed as a whole by [`EnrollmentForm::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for a wire field name (or [`IMAGE_KEY`])
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn insert(&mut self, key: &str, message: &str) {
        self.0.insert(key.to_string(), message.to_string());
    }
}

/// Form state plus the roster it autofills from
#[derive(Debug, Clone)]
pub struct EnrollmentForm {
    fields: FormFields,
    roster: Arc<RosterIndex>,
}

impl EnrollmentForm {
    pub fn new(roster: Arc<RosterIndex>) -> Self {
        Self {
            fields: FormFields::default(),
            roster,
        }
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    /// Set one field
    ///
    /// Only a registration id change touches other fields (roster autofill).
    /// The registration id is stored trimmed, as it is looked up.
    pub fn set_field(&mut self, name: FieldName, value: impl Into<String>) {
        let mut value = value.into();

        if name == FieldName::RegistrationId {
            value = value.trim().to_string();
            match self.roster.lookup(&value) {
                Some(record) => {
                    debug!(registration_id = %value, "Roster hit, autofilling");
                    self.fields.full_name = record.full_name.clone();
                    self.fields.program = record.program.clone();
                }
                None => {
                    self.fields.full_name.clear();
                    self.fields.program.clear();
                }
            }
        }

        *self.fields.slot(name) = value;
    }

    /// Check every field constraint plus image presence
    ///
    /// Pure: depends only on the current fields and `has_image`.
    pub fn validate(&self, has_image: bool) -> ValidationErrors {
        let fields = &self.fields;
        let mut errors = ValidationErrors::default();

        if !FULL_NAME_RE.is_match(&fields.full_name) {
            errors.insert(
                FieldName::FullName.wire_name(),
                "Nome deve conter apenas letras e ser no máximo 50 caracteres.",
            );
        }

        if !TAX_ID_RE.is_match(&fields.tax_id) {
            errors.insert(FieldName::TaxId.wire_name(), "CPF inválido.");
        }

        if !REGISTRATION_ID_RE.is_match(&fields.registration_id) {
            errors.insert(
                FieldName::RegistrationId.wire_name(),
                "Matrícula deve conter exatamente 6 números.",
            );
        }

        if fields.program.is_empty() {
            errors.insert(FieldName::Program.wire_name(), "Curso é obrigatório.");
        } else if !is_known_program(&fields.program) {
            errors.insert(FieldName::Program.wire_name(), "Curso inválido.");
        }

        if !has_image {
            errors.insert(IMAGE_KEY, "Capture uma imagem antes de enviar.");
        }

        errors
    }

    /// Restore the initial field values
    pub fn reset(&mut self) {
        self.fields = FormFields::default();
    }
}
