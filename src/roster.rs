// 👥 Roster - User list filtering for the user-management page
// Role filter and name search combine; both are case-insensitive.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Professor,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Professor => "professor",
            Role::Student => "student",
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "professor" => Ok(Role::Professor),
            "student" => Ok(Role::Student),
            other => Err(anyhow!("Unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Load users from a CSV file with `id,name,email,role` headers
pub fn load_users_csv(csv_path: &Path) -> Result<Vec<User>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open users CSV: {:?}", csv_path))?;

    let mut users = Vec::new();
    for result in rdr.deserialize() {
        let user: User = result.context("Failed to deserialize user")?;
        users.push(user);
    }

    Ok(users)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterFilter {
    /// `None` shows every role
    pub role: Option<Role>,

    /// Substring of the name; empty shows everyone
    pub search: String,
}

impl RosterFilter {
    pub fn new(role: Option<Role>, search: impl Into<String>) -> Self {
        RosterFilter {
            role,
            search: search.into(),
        }
    }

    pub fn matches(&self, user: &User) -> bool {
        if let Some(role) = self.role {
            if user.role != role {
                return false;
            }
        }

        let search = self.search.trim().to_lowercase();
        search.is_empty() || user.name.to_lowercase().contains(&search)
    }

    /// Matching users, original order kept
    pub fn apply<'a>(&self, users: &'a [User]) -> Vec<&'a User> {
        users.iter().filter(|u| self.matches(u)).collect()
    }
}

/// Parse the role filter value; `all` (or empty) means no role filter
pub fn parse_role_filter(value: &str) -> Result<Option<Role>> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("all") {
        Ok(None)
    } else {
        value.parse().map(Some)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_user(id: &str, name: &str, role: Role) -> User {
        User {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.edu", id),
            role,
        }
    }

    fn users() -> Vec<User> {
        vec![
            create_user("1", "Ana Zapata", Role::Student),
            create_user("2", "Ben Alvarez", Role::Professor),
            create_user("3", "Anabel Ruiz", Role::Student),
            create_user("4", "Root", Role::Admin),
        ]
    }

    #[test]
    fn test_no_filter_shows_everyone() {
        let users = users();
        assert_eq!(RosterFilter::default().apply(&users).len(), 4);
    }

    #[test]
    fn test_role_filter() {
        let users = users();
        let filter = RosterFilter::new(Some(Role::Student), "");

        let ids: Vec<&str> = filter.apply(&users).iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_search_is_trimmed_and_case_insensitive() {
        let users = users();
        let filter = RosterFilter::new(None, "  ANA ");

        let ids: Vec<&str> = filter.apply(&users).iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_role_and_search_combine() {
        let users = users();
        let filter = RosterFilter::new(Some(Role::Professor), "ana");

        assert!(filter.apply(&users).is_empty());
    }

    #[test]
    fn test_parse_role_filter() {
        assert_eq!(parse_role_filter("all").unwrap(), None);
        assert_eq!(parse_role_filter("").unwrap(), None);
        assert_eq!(parse_role_filter("Student").unwrap(), Some(Role::Student));
        assert!(parse_role_filter("janitor").is_err());
    }
}
