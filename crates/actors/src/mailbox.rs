use tokio::sync::mpsc::{self, error::TrySendError};

use crate::{actor::ActorError, handler::MessageHandler, Actor};

pub type Envelope<A> = Box<dyn MessageHandler<A>>;

pub struct BoundedMailbox<A: Actor>(mpsc::Sender<Envelope<A>>);

impl<A: Actor> Clone for BoundedMailbox<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A: Actor> BoundedMailbox<A> {
    /// Waits for free capacity, then enqueues the message.
    pub async fn send<M>(&self, message: M) -> Result<(), ActorError>
    where
        M: MessageHandler<A> + 'static,
    {
        self.0
            .send(Box::new(message))
            .await
            .map_err(|_| ActorError::Closed)
    }

    /// Enqueues the message without waiting.
    pub fn try_send<M>(&self, message: M) -> Result<(), ActorError>
    where
        M: MessageHandler<A> + 'static,
    {
        self.0.try_send(Box::new(message)).map_err(|why| match why {
            TrySendError::Full(_) => ActorError::MailboxFull,
            TrySendError::Closed(_) => ActorError::Closed,
        })
    }

    pub(crate) fn downgrade(&self) -> WeakMailbox<A> {
        WeakMailbox(self.0.downgrade())
    }
}

pub struct WeakMailbox<A: Actor>(mpsc::WeakSender<Envelope<A>>);

impl<A: Actor> Clone for WeakMailbox<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A: Actor> WeakMailbox<A> {
    pub(crate) fn upgrade(&self) -> Option<BoundedMailbox<A>> {
        self.0.upgrade().map(BoundedMailbox)
    }
}

pub struct BoundedMailboxReceiver<A: Actor>(mpsc::Receiver<Envelope<A>>);

impl<A: Actor> BoundedMailboxReceiver<A> {
    pub async fn recv(&mut self) -> Option<Envelope<A>> {
        self.0.recv().await
    }
}

pub fn bounded_mailbox<A>(buffer: usize) -> (BoundedMailbox<A>, BoundedMailboxReceiver<A>)
where
    A: Actor,
{
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (BoundedMailbox(tx), BoundedMailboxReceiver(rx))
}
