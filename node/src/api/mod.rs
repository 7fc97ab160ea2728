//! # Director API
//!
//! External Rust interface to a running director. Commands travel over a
//! channel into the director loop; replies come back over oneshot channels.

use std::fmt::Display;

use thiserror::Error;
use tokio::sync::mpsc::{channel, Receiver, Sender};
use tokio::sync::oneshot;

use crate::director::{DirectorStatus, MinedResult, MiningRequestId};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    ApiError(String),
}

#[derive(Debug)]
pub(crate) enum ApiCmd {
    Start(oneshot::Sender<Result<(), ApiError>>),
    SubmitSolution {
        randomness: u64,
        request_id: MiningRequestId,
        reply: oneshot::Sender<Result<MinedResult, ApiError>>,
    },
    QueryStatus(oneshot::Sender<Result<DirectorStatus, ApiError>>),
}

impl Display for ApiCmd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiCmd::Start(_) => write!(f, "Start"),
            ApiCmd::SubmitSolution { request_id, .. } => {
                write!(f, "SubmitSolution({request_id})")
            }
            ApiCmd::QueryStatus(_) => write!(f, "QueryStatus"),
        }
    }
}

pub(crate) struct ApiListener {
    pub(crate) commands_rcv: Receiver<ApiCmd>,
}

impl ApiListener {
    pub(crate) fn new(commands_rcv: Receiver<ApiCmd>) -> Self {
        Self { commands_rcv }
    }
}

#[derive(Clone)]
pub struct DirectorApi {
    pub(crate) commands_channel: Sender<ApiCmd>,
}

impl DirectorApi {
    pub(crate) fn new() -> (DirectorApi, ApiListener) {
        let (commands_channel, commands_rcv) = channel(100);
        let api_listener = ApiListener::new(commands_rcv);
        let api = DirectorApi { commands_channel };
        (api, api_listener)
    }

    /// Start reacting to chain events. If the chain is already synchronized
    /// and has a head, construction begins immediately.
    pub async fn start(&self) -> Result<(), ApiError> {
        log::trace!("start()");
        self.send_and_wait_response(ApiCmd::Start).await
    }

    /// Report an externally found proof for the candidate dispatched under
    /// `request_id`.
    pub async fn submit_solution(
        &self,
        randomness: u64,
        request_id: MiningRequestId,
    ) -> Result<MinedResult, ApiError> {
        log::trace!("submit_solution({randomness}, {request_id})");
        self.send_and_wait_response(|reply| ApiCmd::SubmitSolution {
            randomness,
            request_id,
            reply,
        })
        .await
    }

    /// Current state plus the instance-owned counters.
    pub async fn status(&self) -> Result<DirectorStatus, ApiError> {
        log::trace!("status()");
        self.send_and_wait_response(ApiCmd::QueryStatus).await
    }

    async fn send_and_wait_response<F, R>(&self, f: F) -> Result<R, ApiError>
    where
        F: FnOnce(oneshot::Sender<Result<R, ApiError>>) -> ApiCmd,
        R: Send + 'static,
    {
        let (tx, rcv) = oneshot::channel();
        let cmd = f(tx);
        if let Err(err) = self.commands_channel.send(cmd).await {
            log::error!("Failed to send command to director: {err:?}");
            return Err(ApiError::ApiError(
                "Api channel closed. It means that probably the director has crashed".to_string(),
            ));
        }
        rcv.await.map_err(|err| {
            log::error!("Failed to receive response from director: {err:?}");
            ApiError::ApiError("Failed to receive response from director".to_string())
        })?
    }
}
