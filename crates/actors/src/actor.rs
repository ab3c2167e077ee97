use core::fmt;
use std::{any::Any, error::Error};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::actor_ref::WeakActorRef;

#[derive(Debug, Clone)]
pub enum SupervisionStrategy {
    Restart,
    Resume,
    Stop,
}

#[async_trait]
pub trait Actor: Send + Sync + 'static {
    /// Called once before the first message is handled, and again after every
    /// restart. `myself` can be upgraded to post messages back into the
    /// actor's own mailbox from spawned tasks.
    #[allow(unused_variables)]
    async fn started(&mut self, myself: WeakActorRef<Self>)
    where
        Self: Sized,
    {
    }

    /// Called when a handler on the actor panics. The return value represents the
    /// supervision strategy used to handle the panic.
    /// NOTE: If this method panics, the actor can not recover from the panic.
    #[allow(unused_variables)]
    fn on_fail(&mut self, error: Box<dyn Any + Send>) -> SupervisionStrategy {
        SupervisionStrategy::Restart
    }
}

#[derive(Debug)]
pub enum ActorError {
    /// The actor stopped and its mailbox is closed.
    Closed,
    /// `try_tell` found the mailbox at capacity.
    MailboxFull,
    /// The actor dropped the request without answering, usually because the
    /// handler panicked.
    NoResponse(oneshot::error::RecvError),
}

impl Error for ActorError {}

impl fmt::Display for ActorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "actor mailbox is closed"),
            Self::MailboxFull => write!(f, "actor mailbox is full"),
            Self::NoResponse(why) => write!(f, "actor did not respond: {}", why),
        }
    }
}

impl From<oneshot::error::RecvError> for ActorError {
    fn from(why: oneshot::error::RecvError) -> Self {
        Self::NoResponse(why)
    }
}
