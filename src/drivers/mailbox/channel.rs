//! One request/acknowledge channel
//!
//! The caller side holds the transaction lock for the whole request,
//! including the acknowledge wait. The dispatcher side never touches that
//! lock: it decodes into the acknowledge buffer (a short `IrqMutex`
//! section) and completes the waiter.

use log::debug;

use super::transaction::{AckReader, Transaction};
use super::Protocol;
use crate::drivers::bus::Bus;
use crate::sync::{Completion, IrqMutex};

/// Result of reading an acknowledge in interrupt context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Decoded into the acknowledge buffer, waiter may be signaled
    Recognized,
    /// Header this mailbox never answers with
    Unknown(u8),
}

/// Channel state for one answered mailbox
pub struct Channel<M: Protocol> {
    state: spin::Mutex<M::Request>,
    ack: IrqMutex<M::Ack>,
    pub(super) done: Completion,
}

impl<M: Protocol> Channel<M> {
    pub fn new() -> Self {
        Self {
            state: spin::Mutex::new(M::Request::default()),
            ack: IrqMutex::new(M::Ack::default()),
            done: Completion::new(),
        }
    }

    /// Take the transaction lock, spinning while another caller holds it.
    ///
    /// Must not be called from interrupt context.
    pub fn begin(&self) -> Transaction<'_, M> {
        Transaction {
            channel: self,
            state: self.state.lock(),
        }
    }

    /// Take the transaction lock if it is free.
    pub fn try_begin(&self) -> Option<Transaction<'_, M>> {
        self.state.try_lock().map(|state| Transaction {
            channel: self,
            state,
        })
    }

    /// Copy of the most recently delivered acknowledge
    pub fn last_ack(&self) -> M::Ack {
        *self.ack.lock()
    }

    /// Decode the pending acknowledge into the buffer (interrupt context).
    pub fn deliver<B: Bus + ?Sized>(&self, bus: &B) -> Delivery {
        let reader = AckReader::new(bus, M::ID);
        let header = reader.header();
        match M::decode(&reader, header) {
            Some(ack) => {
                *self.ack.lock() = ack;
                Delivery::Recognized
            }
            None => Delivery::Unknown(header),
        }
    }

    /// Wake the waiter of a recognized acknowledge (interrupt context).
    ///
    /// Returns `false` when no transaction was waiting; the acknowledge
    /// stays in the buffer but nobody consumes it.
    pub fn signal(&self) -> bool {
        let woken = self.done.complete();
        if !woken {
            debug!("{}: late acknowledge dropped", M::ID);
        }
        woken
    }
}

impl<M: Protocol> Default for Channel<M> {
    fn default() -> Self {
        Self::new()
    }
}
