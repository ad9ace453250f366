pub mod filter;

use chrono::{DateTime, NaiveDate};
use serde::{Serialize, Serializer};

/// One commit as the rest of the crate sees it, independent of the wire
/// format it was fetched in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub id: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub authored_at: String,
}

impl CommitRecord {
    /// Calendar date of `authored_at` in the offset the host reported.
    ///
    /// Returns `None` for anything that is not a full RFC 3339 timestamp.
    pub fn authored_date(&self) -> Option<NaiveDate> {
        DateTime::parse_from_rfc3339(self.authored_at.trim())
            .ok()
            .map(|timestamp| timestamp.date_naive())
    }
}

// Outbound JSON keeps the host's nested layout so existing consumers of
// `commitData` and the dump files read it unchanged.
#[derive(Serialize)]
struct NestedCommit<'a> {
    sha: &'a str,
    commit: NestedDetail<'a>,
}

#[derive(Serialize)]
struct NestedDetail<'a> {
    message: &'a str,
    author: NestedAuthor<'a>,
}

#[derive(Serialize)]
struct NestedAuthor<'a> {
    name: &'a str,
    email: &'a str,
    date: &'a str,
}

impl Serialize for CommitRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        NestedCommit {
            sha: &self.id,
            commit: NestedDetail {
                message: &self.message,
                author: NestedAuthor {
                    name: &self.author_name,
                    email: &self.author_email,
                    date: &self.authored_at,
                },
            },
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
pub(crate) fn sample(id: &str, authored_at: &str) -> CommitRecord {
    CommitRecord {
        id: id.to_string(),
        message: format!("commit {id}"),
        author_name: "A".to_string(),
        author_email: "a@x.com".to_string(),
        authored_at: authored_at.to_string(),
    }
}
