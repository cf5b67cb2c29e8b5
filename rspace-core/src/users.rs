//! Building user-creation requests from flags or from a CSV file.
//!
//! CSV layout (header row first, then one user per row):
//! `first,last,email,role,username,password,affiliation,apiKey`

use std::fmt;
use std::io::Read;

use crate::contract::{UserPost, UserRole};

/// One data row of a users CSV. Fields may be empty; validation happens when
/// the row is turned into a [`UserPost`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRow {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub username: String,
    pub password: String,
    pub affiliation: String,
    pub api_key: String,
}

#[derive(Debug, PartialEq)]
pub enum UserError {
    Missing(&'static str),
    InvalidEmail(String),
    Csv(String),
}

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserError::Missing(field) => write!(f, "{field} is required"),
            UserError::InvalidEmail(email) => write!(f, "'{email}' is not a valid email address"),
            UserError::Csv(e) => write!(f, "cannot read user file: {e}"),
        }
    }
}

impl std::error::Error for UserError {}

impl From<csv::Error> for UserError {
    fn from(e: csv::Error) -> Self {
        UserError::Csv(e.to_string())
    }
}

impl UserRow {
    fn from_record(record: &csv::StringRecord) -> Self {
        let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();
        Self {
            first_name: field(0),
            last_name: field(1),
            email: field(2),
            role: field(3),
            username: field(4),
            password: field(5),
            affiliation: field(6),
            api_key: field(7),
        }
    }

    /// Validates the row and builds the request.
    pub fn into_post(self) -> Result<UserPost, UserError> {
        if self.username.is_empty() {
            return Err(UserError::Missing("username"));
        }
        if self.email.is_empty() {
            return Err(UserError::Missing("email"));
        }
        if !self.email.contains('@') {
            return Err(UserError::InvalidEmail(self.email));
        }
        if self.password.is_empty() {
            return Err(UserError::Missing("password"));
        }
        Ok(UserPost {
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            role: UserRole::from_arg(&self.role),
            affiliation: self.affiliation,
            password: self.password,
            api_key: Some(self.api_key).filter(|k| !k.is_empty()),
        })
    }
}

/// Reads every data row, skipping the header. Rows may have fewer than
/// eight columns; missing columns are empty.
pub fn read_user_rows<R: Read>(reader: R) -> Result<Vec<UserRow>, UserError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in csv.records() {
        rows.push(UserRow::from_record(&record?));
    }
    Ok(rows)
}
