use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info};

use crate::db::models::{Document, Message, Status, StatusCounts, Ticket, TicketWithMessage};
use crate::db::store::{self, LoadError, SaveError};

/// Errors returned by repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("No such ticket with id: {0}")]
    TicketNotFound(String),

    #[error("{}", message_not_found(.message_id, .ticket_id.as_deref()))]
    MessageNotFound {
        message_id: String,
        /// Set when the lookup was on behalf of a ticket.
        ticket_id: Option<String>,
    },

    /// Reserved; authors are embedded in messages and never looked up.
    #[error("No such author with id: {0}")]
    AuthorNotFound(String),

    #[error("Error in saving data with the root error: {0}")]
    SaveFailed(#[from] SaveError),
}

fn message_not_found(message_id: &str, ticket_id: Option<&str>) -> String {
    match ticket_id {
        Some(ticket_id) => format!(
            "No such message with id {} for ticket with id: {}",
            message_id, ticket_id
        ),
        None => format!("No such message with id: {}", message_id),
    }
}

/// In-memory ticket inbox over a single JSON document.
///
/// Reads share a read lock. Status changes hold the write lock across both
/// the mutation and the full-file rewrite, so rewrites never interleave.
pub struct TicketRepository {
    path: PathBuf,
    document: RwLock<Document>,
}

impl TicketRepository {
    /// Load the data file at `path`. Fails fast on any invalid record.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LoadError> {
        let path = path.into();
        let document = store::load(&path)?;
        Ok(Self::new(path, document))
    }

    /// Wrap an already loaded document. Mutations are saved to `path`.
    pub fn new(path: impl Into<PathBuf>, document: Document) -> Self {
        Self {
            path: path.into(),
            document: RwLock::new(document),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // A panicking reader can't leave the document half-updated, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, Document> {
        self.document.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Document> {
        self.document.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of tickets in each status.
    pub fn count_by_status(&self) -> StatusCounts {
        let doc = self.read();
        let mut counts = StatusCounts::default();
        for ticket in &doc.tickets {
            counts.increment(ticket.status);
        }
        counts
    }

    /// Tickets in storage order: filtered by `statuses`, then the first
    /// `skip` matches dropped, then at most `limit` returned.
    pub fn list_tickets(
        &self,
        skip: usize,
        limit: Option<usize>,
        statuses: Option<&[Status]>,
    ) -> Vec<Ticket> {
        let doc = self.read();
        select(&doc.tickets, skip, limit, statuses).cloned().collect()
    }

    /// Like [`list_tickets`](Self::list_tickets) with each ticket's primary
    /// message attached. A single dangling `msg_id` fails the whole call.
    pub fn list_tickets_with_message(
        &self,
        skip: usize,
        limit: Option<usize>,
        statuses: Option<&[Status]>,
    ) -> Result<Vec<TicketWithMessage>, RepositoryError> {
        let doc = self.read();
        select(&doc.tickets, skip, limit, statuses)
            .map(|ticket| {
                find_message(&doc.messages, &ticket.msg_id)
                    .map(|message| TicketWithMessage {
                        ticket: ticket.clone(),
                        message: message.clone(),
                    })
                    .ok_or_else(|| RepositoryError::MessageNotFound {
                        message_id: ticket.msg_id.clone(),
                        ticket_id: Some(ticket.id.clone()),
                    })
            })
            .collect()
    }

    pub fn get_ticket(&self, ticket_id: &str) -> Result<Ticket, RepositoryError> {
        let doc = self.read();
        find_ticket(&doc.tickets, ticket_id).cloned()
    }

    pub fn get_message(&self, message_id: &str) -> Result<Message, RepositoryError> {
        let doc = self.read();
        find_message(&doc.messages, message_id)
            .cloned()
            .ok_or_else(|| RepositoryError::MessageNotFound {
                message_id: message_id.to_string(),
                ticket_id: None,
            })
    }

    /// The primary message of a ticket.
    pub fn get_ticket_message(&self, ticket_id: &str) -> Result<Message, RepositoryError> {
        let doc = self.read();
        let ticket = find_ticket(&doc.tickets, ticket_id)?;
        find_message(&doc.messages, &ticket.msg_id)
            .cloned()
            .ok_or_else(|| RepositoryError::MessageNotFound {
                message_id: ticket.msg_id.clone(),
                ticket_id: Some(ticket.id.clone()),
            })
    }

    /// Stored messages referenced by the ticket's context list.
    ///
    /// Returned in message storage order, not context-list order. Ids with
    /// no stored message are skipped.
    pub fn get_ticket_context_messages(
        &self,
        ticket_id: &str,
    ) -> Result<Vec<Message>, RepositoryError> {
        let doc = self.read();
        let ticket = find_ticket(&doc.tickets, ticket_id)?;
        Ok(doc
            .messages
            .iter()
            .filter(|m| ticket.context_messages.contains(&m.id))
            .cloned()
            .collect())
    }

    pub fn resolve_ticket(&self, ticket_id: &str) -> Result<Ticket, RepositoryError> {
        self.set_status(ticket_id, Status::Resolved)
    }

    /// Soft delete: the ticket stays stored with status `deleted`.
    pub fn delete_ticket(&self, ticket_id: &str) -> Result<Ticket, RepositoryError> {
        self.set_status(ticket_id, Status::Deleted)
    }

    /// Apply a status change and rewrite the data file. If the rewrite
    /// fails the in-memory change is kept.
    fn set_status(&self, ticket_id: &str, status: Status) -> Result<Ticket, RepositoryError> {
        let mut doc = self.write();

        let ticket = doc
            .tickets
            .iter_mut()
            .find(|t| t.id == ticket_id)
            .ok_or_else(|| RepositoryError::TicketNotFound(ticket_id.to_string()))?;
        let previous = ticket.status;
        ticket.status = status;
        ticket.ts_last_status_change = Some(Utc::now());
        let updated = ticket.clone();

        if let Err(e) = store::save(&self.path, &doc) {
            error!(ticket_id, error = %e, "failed to persist status change");
            return Err(RepositoryError::SaveFailed(e));
        }

        info!(ticket_id, from = %previous, to = %status, "ticket status changed");
        Ok(updated)
    }
}

fn select<'a>(
    tickets: &'a [Ticket],
    skip: usize,
    limit: Option<usize>,
    statuses: Option<&'a [Status]>,
) -> impl Iterator<Item = &'a Ticket> {
    tickets
        .iter()
        .filter(move |t| statuses.is_none_or(|s| s.contains(&t.status)))
        .skip(skip)
        .take(limit.unwrap_or(usize::MAX))
}

fn find_ticket<'a>(tickets: &'a [Ticket], ticket_id: &str) -> Result<&'a Ticket, RepositoryError> {
    tickets
        .iter()
        .find(|t| t.id == ticket_id)
        .ok_or_else(|| RepositoryError::TicketNotFound(ticket_id.to_string()))
}

fn find_message<'a>(messages: &'a [Message], message_id: &str) -> Option<&'a Message> {
    messages.iter().find(|m| m.id == message_id)
}
