//! Encoding and decoding helpers between domain types and the plain column
//! values stored in SQLite.
//!
//! Timestamps are stored as RFC 3339 strings. Identifiers are stored as plain
//! integers, span offsets as two nullable integer columns.

use chrono::{DateTime, Utc};
use discuss_core::{
  argument::{Argument, ArgumentId, Placement, ResponseSpan, UserId},
  tag::{Tag, TagId},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Placement ───────────────────────────────────────────────────────────────

/// The `(title, in_response_to, span_start, span_end)` columns for a
/// placement. A response never stores a title.
pub type PlacementColumns = (Option<String>, Option<i64>, Option<u32>, Option<u32>);

pub fn encode_placement(p: Placement) -> PlacementColumns {
  match p {
    Placement::TopLevel { title } => (title, None, None, None),
    Placement::Response { parent, span } => {
      (None, Some(parent.0), Some(span.start), Some(span.end))
    }
  }
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// Column projection shared by every argument query.
pub const ARGUMENT_COLUMNS: &str =
  "id, author_id, body, title, in_response_to, span_start, span_end, created_at";

/// An `arguments` row as read from SQLite, before decoding.
pub struct RawArgument {
  pub id:             i64,
  pub author_id:      i64,
  pub body:           String,
  pub title:          Option<String>,
  pub in_response_to: Option<i64>,
  pub span_start:     Option<u32>,
  pub span_end:       Option<u32>,
  pub created_at:     String,
}

impl RawArgument {
  /// Read a row selected with [`ARGUMENT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      author_id:      row.get(1)?,
      body:           row.get(2)?,
      title:          row.get(3)?,
      in_response_to: row.get(4)?,
      span_start:     row.get(5)?,
      span_end:       row.get(6)?,
      created_at:     row.get(7)?,
    })
  }

  pub fn into_argument(self) -> Result<Argument> {
    // The table CHECK keeps both offsets present or both absent.
    let response_span = match (self.span_start, self.span_end) {
      (Some(start), Some(end)) => Some(ResponseSpan { start, end }),
      _ => None,
    };
    Ok(Argument {
      id: ArgumentId(self.id),
      author_id: UserId(self.author_id),
      text: self.body,
      title: self.title,
      in_response_to: self.in_response_to.map(ArgumentId),
      response_span,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A `tags` row as read from SQLite, before decoding.
pub struct RawTag {
  pub id:         i64,
  pub name:       String,
  pub created_at: String,
}

impl RawTag {
  pub fn into_tag(self) -> Result<Tag> {
    Ok(Tag {
      id:         TagId(self.id),
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Constraint errors ───────────────────────────────────────────────────────

/// Whether `e` is a `FOREIGN KEY constraint failed` error.
pub fn is_foreign_key_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
  )
}
