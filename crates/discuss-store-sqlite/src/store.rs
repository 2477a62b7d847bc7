//! [`SqliteStore`]: the SQLite implementation of [`DiscussStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use discuss_core::{
  argument::{Argument, ArgumentId, ArgumentView, NewArgument, UserId},
  store::{DiscussStore, Feed},
  tag::{Tag, TagId},
  vote::VoteState,
};

use crate::{
  Error, Result,
  encode::{
    ARGUMENT_COLUMNS, RawArgument, RawTag, encode_dt, encode_placement,
    is_foreign_key_violation,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Discuss store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// are serialised onto the connection's thread; multi-statement operations
/// additionally run inside a transaction.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of vote rows for `argument`. Counted, never cached.
  #[cfg(test)]
  pub(crate) async fn vote_count(&self, argument: ArgumentId) -> Result<u64> {
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM votes WHERE argument_id = ?1",
          rusqlite::params![argument.0],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(count as u64)
  }
}

// ─── DiscussStore impl ───────────────────────────────────────────────────────

impl DiscussStore for SqliteStore {
  type Error = Error;

  // ── Arguments ─────────────────────────────────────────────────────────────

  async fn create_argument(&self, input: NewArgument) -> Result<Argument> {
    let (title, in_response_to, span_start, span_end) =
      encode_placement(input.placement);
    let tag_ids: Vec<i64> = input.tag_ids.iter().map(|t| t.0).collect();

    let mut raw = RawArgument {
      id: 0,
      author_id: input.author_id.0,
      body: input.text,
      title,
      in_response_to,
      span_start,
      span_end,
      created_at: encode_dt(Utc::now()),
    };

    // `Err(tag)` means a tag id did not exist; the transaction is dropped
    // without committing, so neither the argument nor any association stays.
    let outcome: std::result::Result<RawArgument, i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO arguments (
             author_id, body, title, in_response_to, span_start, span_end, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            raw.author_id,
            raw.body,
            raw.title,
            raw.in_response_to,
            raw.span_start,
            raw.span_end,
            raw.created_at,
          ],
        )?;
        raw.id = tx.last_insert_rowid();

        {
          let mut stmt = tx.prepare(
            "INSERT INTO argument_tags (argument_id, tag_id) VALUES (?1, ?2)",
          )?;
          for tag in tag_ids {
            match stmt.execute(rusqlite::params![raw.id, tag]) {
              Ok(_) => {}
              Err(e) if is_foreign_key_violation(&e) => return Ok(Err(tag)),
              Err(e) => return Err(e.into()),
            }
          }
        }

        tx.commit()?;
        Ok(Ok(raw))
      })
      .await?;

    outcome
      .map_err(|tag| Error::UnknownTag(TagId(tag)))?
      .into_argument()
  }

  async fn get_argument(&self, id: ArgumentId) -> Result<Option<Argument>> {
    let raw: Option<RawArgument> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ARGUMENT_COLUMNS} FROM arguments WHERE id = ?1"),
              rusqlite::params![id.0],
              RawArgument::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawArgument::into_argument).transpose()
  }

  async fn read_argument(&self, id: ArgumentId) -> Result<Option<ArgumentView>> {
    // One read transaction so the tags and the count describe the same
    // snapshot as the row.
    let raw: Option<(RawArgument, Vec<i64>, i64)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(argument) = tx
          .query_row(
            &format!("SELECT {ARGUMENT_COLUMNS} FROM arguments WHERE id = ?1"),
            rusqlite::params![id.0],
            RawArgument::from_row,
          )
          .optional()?
        else {
          return Ok(None);
        };

        let tags = {
          let mut stmt =
            tx.prepare("SELECT tag_id FROM argument_tags WHERE argument_id = ?1")?;
          let rows = stmt
            .query_map(rusqlite::params![id.0], |r| r.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
          rows
        };

        let votes: i64 = tx.query_row(
          "SELECT COUNT(*) FROM votes WHERE argument_id = ?1",
          rusqlite::params![id.0],
          |r| r.get(0),
        )?;

        tx.commit()?;
        Ok(Some((argument, tags, votes)))
      })
      .await?;

    let Some((argument, tags, votes)) = raw else {
      return Ok(None);
    };
    Ok(Some(ArgumentView {
      argument: argument.into_argument()?,
      tag_ids:  tags.into_iter().map(TagId).collect(),
      votes:    votes as u64,
    }))
  }

  async fn feed(&self, feed: Feed) -> Result<Vec<ArgumentId>> {
    let (condition, param): (&'static str, Option<i64>) = match feed {
      Feed::TopLevel => ("in_response_to IS NULL", None),
      Feed::Responses => ("in_response_to IS NOT NULL", None),
      Feed::RepliesTo(parent) => ("in_response_to = ?1", Some(parent.0)),
      Feed::ByAuthor(user) => ("author_id = ?1", Some(user.0)),
    };

    let ids: Vec<i64> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT id FROM arguments WHERE {condition} ORDER BY id DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(param), |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(ids.into_iter().map(ArgumentId).collect())
  }

  // ── Tags ──────────────────────────────────────────────────────────────────

  async fn create_tag(&self, name: String) -> Result<Tag> {
    let mut raw = RawTag {
      id: 0,
      name,
      created_at: encode_dt(Utc::now()),
    };

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tags (name, created_at) VALUES (?1, ?2)",
          rusqlite::params![raw.name, raw.created_at],
        )?;
        raw.id = conn.last_insert_rowid();
        Ok(raw)
      })
      .await?;

    raw.into_tag()
  }

  async fn get_tag(&self, id: TagId) -> Result<Option<Tag>> {
    let raw: Option<RawTag> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, name, created_at FROM tags WHERE id = ?1",
              rusqlite::params![id.0],
              |row| {
                Ok(RawTag {
                  id:         row.get(0)?,
                  name:       row.get(1)?,
                  created_at: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTag::into_tag).transpose()
  }

  async fn list_tags(&self) -> Result<Vec<TagId>> {
    let ids: Vec<i64> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT id FROM tags ORDER BY id")?;
        let rows = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(ids.into_iter().map(TagId).collect())
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  async fn toggle_vote(&self, user: UserId, argument: ArgumentId) -> Result<VoteState> {
    // Delete-or-insert under an IMMEDIATE transaction: the write lock is held
    // from the first statement, so no other writer can observe the pair
    // between the two halves. The primary key backs the at-most-one rule.
    let state: Option<VoteState> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed = tx.execute(
          "DELETE FROM votes WHERE user_id = ?1 AND argument_id = ?2",
          rusqlite::params![user.0, argument.0],
        )?;
        let state = if removed > 0 {
          VoteState::Withdrawn
        } else {
          match tx.execute(
            "INSERT INTO votes (user_id, argument_id) VALUES (?1, ?2)",
            rusqlite::params![user.0, argument.0],
          ) {
            Ok(_) => VoteState::Cast,
            Err(e) if is_foreign_key_violation(&e) => return Ok(None),
            Err(e) => return Err(e.into()),
          }
        };
        tx.commit()?;
        Ok(Some(state))
      })
      .await?;

    state.ok_or(Error::ArgumentNotFound(argument))
  }
}
