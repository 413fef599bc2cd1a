use std::any::Any;

use diesel::connection::SimpleConnection;
use diesel::SqliteConnection;
use ledgersync_core::errors::{DatabaseError, Error, Result};
use log::{debug, warn};
use tokio::sync::{mpsc, oneshot};

use super::open_connection;
use crate::errors::StorageError;

// A job runs against the actor's connection and returns a core Result.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;

// Job return values are type-erased so a single channel carries every job.
type AnyValue = Box<dyn Any + Send + 'static>;

enum Command {
    Exec {
        job: Job<AnyValue>,
        in_transaction: bool,
        reply: oneshot::Sender<Result<AnyValue>>,
    },
    Close {
        reply: oneshot::Sender<Result<()>>,
    },
    Open {
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Handle for sending jobs to the connection actor.
///
/// The actor owns the only connection to the store file. Jobs run one at a
/// time, so foreign-key pragmas set by one job stay in effect for the next.
#[derive(Clone)]
pub struct ConnectionHandle {
    tx: mpsc::Sender<Command>,
}

impl ConnectionHandle {
    /// Runs `job` on the connection outside any transaction.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.submit(job, false).await
    }

    /// Runs `job` inside an immediate transaction; any error rolls it back.
    pub async fn exec_in_transaction<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.submit(job, true).await
    }

    /// Checkpoints the WAL and drops the connection. Jobs sent while closed
    /// fail with `DatabaseError::NotOpen`.
    pub async fn close(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Close { reply }).await?;
        Self::receive(rx).await?
    }

    /// Reopens the connection after `close`. A no-op when already open.
    pub async fn open(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Open { reply }).await?;
        Self::receive(rx).await?
    }

    async fn submit<F, T>(&self, job: F, in_transaction: bool) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Exec {
            job: Box::new(move |c| job(c).map(|v| Box::new(v) as AnyValue)),
            in_transaction,
            reply,
        })
        .await?;

        let boxed = Self::receive(rx).await??;
        boxed.downcast::<T>().map(|v| *v).map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "connection actor returned a value of an unexpected type".to_string(),
            ))
        })
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).await.map_err(|_| {
            StorageError::ActorStopped("the receiving channel was closed".to_string()).into()
        })
    }

    async fn receive<T>(rx: oneshot::Receiver<T>) -> Result<T> {
        rx.await.map_err(|_| {
            StorageError::ActorStopped("the reply sender was dropped".to_string()).into()
        })
    }
}

/// Spawns a background Tokio task owning a single connection to `db_path`.
///
/// The connection is opened before the task starts so that an unreachable
/// store fails here rather than on the first job.
pub fn spawn_connection_actor(db_path: String) -> Result<ConnectionHandle> {
    let initial = open_connection(&db_path)?;
    let (tx, mut rx) = mpsc::channel::<Command>(1024);

    tokio::spawn(async move {
        let mut conn = Some(initial);

        while let Some(command) = rx.recv().await {
            match command {
                Command::Exec {
                    job,
                    in_transaction,
                    reply,
                } => {
                    let result = match conn.as_mut() {
                        None => Err(Error::Database(DatabaseError::NotOpen)),
                        Some(c) if in_transaction => c
                            .immediate_transaction::<_, StorageError, _>(|tx| {
                                job(tx).map_err(StorageError::from)
                            })
                            .map_err(Error::from),
                        Some(c) => job(c),
                    };
                    // The requester may have gone away; nothing to do then.
                    let _ = reply.send(result);
                }
                Command::Close { reply } => {
                    if let Some(mut c) = conn.take() {
                        if let Err(e) = c.batch_execute("PRAGMA wal_checkpoint(TRUNCATE);") {
                            warn!("WAL checkpoint before close failed: {}", e);
                        }
                        debug!("[DB connection closed]: {}", db_path);
                    }
                    let _ = reply.send(Ok(()));
                }
                Command::Open { reply } => {
                    let result = if conn.is_some() {
                        Ok(())
                    } else {
                        open_connection(&db_path).map(|c| {
                            debug!("[DB connection opened]: {}", db_path);
                            conn = Some(c);
                        })
                    };
                    let _ = reply.send(result);
                }
            }
        }
        // All handles dropped: the connection closes with the task.
    });

    Ok(ConnectionHandle { tx })
}
