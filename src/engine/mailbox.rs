use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use crate::model::proposal::Proposal;

/// Single-slot handoff between a provider call and the next tick.
///
/// At most one call is in flight. A later delivery overwrites an undrained
/// one.
#[derive(Debug, Default)]
pub struct ProposalMailbox {
    in_flight: Mutex<bool>,
    slot: Mutex<Option<Proposal>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ProposalMailbox {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claim the in-flight flag. `None` while another call is outstanding.
    pub fn try_begin(self: &Arc<Self>) -> Option<CallTicket> {
        let mut in_flight = lock(&self.in_flight);
        if *in_flight {
            return None;
        }
        *in_flight = true;
        Some(CallTicket {
            mailbox: Arc::clone(self),
        })
    }

    /// Non-blocking; empties the slot.
    pub fn take(&self) -> Option<Proposal> {
        lock(&self.slot).take()
    }

    pub fn is_in_flight(&self) -> bool {
        *lock(&self.in_flight)
    }

    pub fn has_pending(&self) -> bool {
        lock(&self.slot).is_some()
    }

    /// Drop any undrained proposal. An outstanding call still clears its
    /// own flag when it finishes.
    pub fn discard(&self) {
        if lock(&self.slot).take().is_some() {
            tracing::info!("discarded undrained proposal");
        }
    }

    fn store(&self, proposal: Proposal) {
        if lock(&self.slot).replace(proposal).is_some() {
            tracing::warn!("undrained proposal overwritten");
        }
    }

    fn finish(&self) {
        *lock(&self.in_flight) = false;
    }
}

/// Held by the running call. Dropping it, delivered or not, clears the
/// in-flight flag.
#[derive(Debug)]
pub struct CallTicket {
    mailbox: Arc<ProposalMailbox>,
}

impl CallTicket {
    pub fn deliver(self, proposal: Proposal) {
        self.mailbox.store(proposal);
    }
}

impl Drop for CallTicket {
    fn drop(&mut self) {
        self.mailbox.finish();
    }
}

pub type CallJob = Box<dyn FnOnce() + Send + 'static>;

/// Where provider calls run.
pub trait CallExecutor: Send + Sync {
    fn execute(&self, job: CallJob);
}

/// One named thread per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadExecutor;

impl CallExecutor for ThreadExecutor {
    fn execute(&self, job: CallJob) {
        let spawned = thread::Builder::new()
            .name("decision-call".into())
            .spawn(job);
        if let Err(e) = spawned {
            // The job, and its ticket, were dropped, so the flag is clear.
            tracing::error!(error = %e, "failed to spawn decision call thread");
        }
    }
}

/// Runs the call on the ticking thread. For tests and hosts that already
/// tick off the main thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl CallExecutor for InlineExecutor {
    fn execute(&self, job: CallJob) {
        job();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::proposal::Posture;

    fn proposal(label: &str) -> Proposal {
        Proposal {
            posture: Some(Posture {
                label: label.into(),
                ..Posture::default()
            }),
            ..Proposal::default()
        }
    }

    #[test]
    fn only_one_call_in_flight() {
        let mailbox = ProposalMailbox::new();
        let ticket = mailbox.try_begin().unwrap();

        assert!(mailbox.is_in_flight());
        assert!(mailbox.try_begin().is_none());

        ticket.deliver(proposal("calm"));
        assert!(!mailbox.is_in_flight());
        assert!(mailbox.try_begin().is_some());
    }

    #[test]
    fn failed_call_clears_flag_and_leaves_slot_empty() {
        let mailbox = ProposalMailbox::new();
        let ticket = mailbox.try_begin().unwrap();
        drop(ticket);

        assert!(!mailbox.is_in_flight());
        assert!(mailbox.take().is_none());
    }

    #[test]
    fn last_delivery_wins() {
        let mailbox = ProposalMailbox::new();
        mailbox.try_begin().unwrap().deliver(proposal("first"));
        mailbox.try_begin().unwrap().deliver(proposal("second"));

        let got = mailbox.take().unwrap();
        assert_eq!(got.posture.unwrap().label, "second");
        assert!(mailbox.take().is_none());
    }

    #[test]
    fn thread_executor_delivers_from_another_thread() {
        let mailbox = ProposalMailbox::new();
        let ticket = mailbox.try_begin().unwrap();
        let (done_tx, done_rx) = std::sync::mpsc::channel();

        ThreadExecutor.execute(Box::new(move || {
            ticket.deliver(proposal("threaded"));
            done_tx.send(()).unwrap();
        }));

        done_rx.recv().unwrap();
        assert_eq!(mailbox.take().unwrap().posture.unwrap().label, "threaded");
    }
}
