// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential store and authenticator

use crate::error::StoreError;
use crate::store::{parsed_column, Store};
use rusqlite::{params, Connection, OptionalExtension, Row};
use sm_core::{account::login_prefix, normalize_login, Clock, Profile, Role};
use std::fmt;

/// Hash a password with bcrypt at the given cost
pub fn hash_password(password: &str, cost: u32) -> Result<String, StoreError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// The account guaranteed to exist after startup
#[derive(Clone)]
pub struct DefaultAccount {
    pub login: String,
    pub password: String,
    pub name: String,
}

impl fmt::Debug for DefaultAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultAccount")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

/// How the default account is reconciled with an existing store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BootstrapPolicy {
    /// Insert the account only into an empty credential table
    #[default]
    CreateIfEmpty,
    /// Overwrite login and password of the matching account on every start
    ResetExisting,
}

/// What the bootstrap did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created { id: i64 },
    Reset { id: i64 },
    /// Credentials already present, left untouched
    Unchanged,
    /// No usable login or password configured
    Skipped,
}

struct CredentialRow {
    profile: Profile,
    password_hash: String,
}

const CREDENTIAL_COLUMNS: &str = "id, name, login, password_hash, role";

fn credential_row(row: &Row<'_>) -> rusqlite::Result<CredentialRow> {
    Ok(CredentialRow {
        profile: Profile {
            id: row.get(0)?,
            name: row.get(1)?,
            login: row.get(2)?,
            role: parsed_column::<Role>(row, 4)?,
        },
        password_hash: row.get(3)?,
    })
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'`
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn find_exact(conn: &Connection, login: &str) -> rusqlite::Result<Option<CredentialRow>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM credentials WHERE LOWER(login) = ?1 ORDER BY id LIMIT 1",
            CREDENTIAL_COLUMNS
        ),
        [login],
        credential_row,
    )
    .optional()
}

/// Stored logins shaped `prefix@<anything>`
fn find_by_prefix(conn: &Connection, prefix: &str) -> rusqlite::Result<Option<CredentialRow>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM credentials WHERE LOWER(login) LIKE ?1 ESCAPE '\\' ORDER BY id LIMIT 1",
            CREDENTIAL_COLUMNS
        ),
        [format!("{}@%", escape_like(prefix))],
        credential_row,
    )
    .optional()
}

/// Identifier lookup in strict order: exact match, then the bare prefix of a
/// domain-qualified identifier, or else any stored `identifier@domain`.
fn lookup(conn: &Connection, normalized: &str) -> rusqlite::Result<Option<CredentialRow>> {
    if let Some(found) = find_exact(conn, normalized)? {
        return Ok(Some(found));
    }
    if normalized.contains('@') {
        match login_prefix(normalized) {
            Some(prefix) => find_exact(conn, prefix),
            None => Ok(None),
        }
    } else {
        find_by_prefix(conn, normalized)
    }
}

impl<C: Clock> Store<C> {
    /// Number of stored credentials
    pub fn credential_count(&self) -> Result<u64, StoreError> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM credentials", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Add a credential. The login is stored normalized.
    pub fn add_credential(
        &self,
        name: &str,
        login: &str,
        password: &str,
        role: Role,
    ) -> Result<Profile, StoreError> {
        let hash = hash_password(password, self.bcrypt_cost)?;
        let conn = self.lock();
        insert_credential(&conn, name, &normalize_login(login), &hash, role, &self.now())
    }

    /// Make sure the default account exists, according to `policy`.
    pub fn ensure_default_account(
        &self,
        account: &DefaultAccount,
        policy: BootstrapPolicy,
    ) -> Result<BootstrapOutcome, StoreError> {
        let login = normalize_login(&account.login);
        if login.is_empty() || account.password.is_empty() {
            return Ok(BootstrapOutcome::Skipped);
        }
        let hash = hash_password(&account.password, self.bcrypt_cost)?;
        let now = self.now();

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let outcome = match policy {
            BootstrapPolicy::CreateIfEmpty => {
                let count: i64 =
                    tx.query_row("SELECT COUNT(*) FROM credentials", [], |row| row.get(0))?;
                if count > 0 {
                    BootstrapOutcome::Unchanged
                } else {
                    let profile =
                        insert_credential(&tx, &account.name, &login, &hash, Role::Admin, &now)?;
                    BootstrapOutcome::Created { id: profile.id }
                }
            }
            BootstrapPolicy::ResetExisting => {
                let existing = match find_exact(&tx, &login)? {
                    Some(found) => Some(found),
                    None => find_by_prefix(&tx, &login)?,
                };
                match existing {
                    Some(found) => {
                        tx.execute(
                            "UPDATE credentials SET login = ?1, password_hash = ?2 WHERE id = ?3",
                            params![login, hash, found.profile.id],
                        )?;
                        BootstrapOutcome::Reset {
                            id: found.profile.id,
                        }
                    }
                    None => {
                        let profile = insert_credential(
                            &tx,
                            &account.name,
                            &login,
                            &hash,
                            Role::Admin,
                            &now,
                        )?;
                        BootstrapOutcome::Created { id: profile.id }
                    }
                }
            }
        };
        tx.commit()?;

        match outcome {
            BootstrapOutcome::Created { id } => {
                tracing::info!(login = %login, id, "default account created")
            }
            BootstrapOutcome::Reset { id } => {
                tracing::warn!(login = %login, id, "default account password reset")
            }
            _ => tracing::debug!(?outcome, "default account bootstrap"),
        }
        Ok(outcome)
    }

    /// Check a login and password.
    ///
    /// Returns `None` for every kind of mismatch, whichever step failed.
    /// When no record matches, a dummy hash is still verified so the cost
    /// of a miss matches the cost of a wrong password.
    pub fn verify_login(&self, login: &str, password: &str) -> Result<Option<Profile>, StoreError> {
        let normalized = normalize_login(login);
        if normalized.is_empty() {
            return Ok(None);
        }

        let found = {
            let conn = self.lock();
            lookup(&conn, &normalized)?
        };

        match found {
            Some(record) => {
                let matches = bcrypt::verify(password, &record.password_hash).unwrap_or_else(|e| {
                    tracing::warn!(id = record.profile.id, error = %e, "unreadable password hash");
                    false
                });
                Ok(matches.then_some(record.profile))
            }
            None => {
                let _ = bcrypt::verify(password, &self.dummy_hash);
                Ok(None)
            }
        }
    }
}

fn insert_credential(
    conn: &Connection,
    name: &str,
    login: &str,
    hash: &str,
    role: Role,
    now: &str,
) -> Result<Profile, StoreError> {
    conn.execute(
        "INSERT INTO credentials (name, login, password_hash, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![name, login, hash, role.as_str(), now],
    )?;
    let id = conn.last_insert_rowid();
    let found = conn
        .query_row(
            &format!("SELECT {} FROM credentials WHERE id = ?1", CREDENTIAL_COLUMNS),
            [id],
            credential_row,
        )
        .optional()?;
    found
        .map(|row| row.profile)
        .ok_or(StoreError::Integrity {
            kind: "credential",
            id,
        })
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
