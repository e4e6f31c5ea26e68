//! Thin façade over intra-process or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees).
//! All handles are **waitable** but non-blocking; the shared-face exchange
//! calls `.wait_timeout()` on every receive and every send, so a vanished
//! peer surfaces as an error instead of a hang.
//! Messages between the same `(src, dst, tag)` triple arrive in send order.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::{Condvar, Mutex};

/// Non-blocking communication interface (minimal by design).
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    /// Rank of this process in the group.
    fn rank(&self) -> usize;
    /// Number of ranks in the group.
    fn size(&self) -> usize;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    /// Post a receive; `buf.len()` is the number of bytes expected.
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;
}

/// A bounded wait ran out of time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Elapsed;

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
    /// Like [`Wait::wait`] but gives up after `timeout`.
    ///
    /// Completed sends yield `Ok(None)`.
    fn wait_timeout(self, timeout: Duration) -> Result<Option<Vec<u8>>, Elapsed>;
}

/// Message tag for one communication epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CommTag(u16);

impl CommTag {
    pub const fn new(tag: u16) -> Self {
        Self(tag)
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Tag `n` steps after this one, for multi-stage exchanges.
    pub const fn offset(self, n: u16) -> Self {
        Self(self.0.wrapping_add(n))
    }
}

/// Compile-time no-op comm for pure serial runs.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
    fn wait_timeout(self, _timeout: Duration) -> Result<Option<Vec<u8>>, Elapsed> {
        Ok(None)
    }
}

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) {}
}

// --- LocalComm: ranks living as threads of one process ---
type Key = (usize, usize, u16); // (src, dst, tag)

#[derive(Default)]
struct Mailbox {
    queues: Mutex<HashMap<Key, VecDeque<Bytes>>>,
    arrived: Condvar,
}

impl Mailbox {
    fn pop(queues: &mut HashMap<Key, VecDeque<Bytes>>, key: &Key) -> Option<Bytes> {
        queues.get_mut(key).and_then(VecDeque::pop_front)
    }
}

/// In-process communicator: every member of a [`LocalComm::group`] shares one
/// mailbox, so ranks can run on separate threads.
#[derive(Clone)]
pub struct LocalComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
}

impl std::fmt::Debug for LocalComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalComm")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .finish()
    }
}

impl LocalComm {
    /// Create `size` connected communicators, one per rank.
    pub fn group(size: usize) -> Vec<LocalComm> {
        let mailbox = Arc::new(Mailbox::default());
        (0..size)
            .map(|rank| LocalComm {
                rank,
                size,
                mailbox: Arc::clone(&mailbox),
            })
            .collect()
    }
}

pub struct LocalHandle {
    mailbox: Arc<Mailbox>,
    key: Key,
}

impl Wait for LocalHandle {
    fn wait(self) -> Option<Vec<u8>> {
        let mut queues = self.mailbox.queues.lock();
        loop {
            if let Some(bytes) = Mailbox::pop(&mut queues, &self.key) {
                return Some(bytes.to_vec());
            }
            self.mailbox.arrived.wait(&mut queues);
        }
    }

    fn wait_timeout(self, timeout: Duration) -> Result<Option<Vec<u8>>, Elapsed> {
        let deadline = Instant::now() + timeout;
        let mut queues = self.mailbox.queues.lock();
        loop {
            if let Some(bytes) = Mailbox::pop(&mut queues, &self.key) {
                return Ok(Some(bytes.to_vec()));
            }
            if self
                .mailbox
                .arrived
                .wait_until(&mut queues, deadline)
                .timed_out()
            {
                return Mailbox::pop(&mut queues, &self.key)
                    .map(|b| Some(b.to_vec()))
                    .ok_or(Elapsed);
            }
        }
    }
}

impl Communicator for LocalComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle {
        let key = (self.rank, peer, tag);
        let mut queues = self.mailbox.queues.lock();
        queues
            .entry(key)
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
        self.mailbox.arrived.notify_all();
    }

    fn irecv(&self, peer: usize, tag: u16, _buf: &mut [u8]) -> Self::RecvHandle {
        LocalHandle {
            mailbox: Arc::clone(&self.mailbox),
            key: (peer, self.rank, tag),
        }
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::{Communicator, Elapsed, Wait};
    use crate::mesh_error::MeshError;
    use mpi::environment::Universe;
    use mpi::point_to_point::{Destination, Source};
    use mpi::request::{Request, StaticScope};
    use mpi::topology::{Communicator as _, SimpleCommunicator};
    use std::time::{Duration, Instant};

    pub struct MpiComm {
        world: SimpleCommunicator,
        rank: usize,
        size: usize,
        _universe: Universe,
    }

    impl MpiComm {
        pub fn new() -> Result<Self, MeshError> {
            let universe = mpi::initialize().ok_or_else(|| MeshError::CommError {
                neighbor: 0,
                reason: "MPI already initialized".into(),
            })?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Ok(Self {
                world,
                rank,
                size,
                _universe: universe,
            })
        }
    }

    /// Leaked buffer kept alive for the lifetime of its request.
    fn leak(bytes: Vec<u8>) -> &'static mut [u8] {
        Box::leak(bytes.into_boxed_slice())
    }

    /// # Safety
    /// `buf` must come from [`leak`] and no request may still reference it.
    unsafe fn reclaim(buf: *mut [u8]) -> Vec<u8> {
        unsafe { Box::from_raw(buf).into_vec() }
    }

    pub struct MpiSendHandle {
        request: Request<'static, [u8], StaticScope>,
        buf: *mut [u8],
    }

    impl Wait for MpiSendHandle {
        fn wait(self) -> Option<Vec<u8>> {
            self.request.wait();
            // SAFETY: the send completed, nothing else references the buffer.
            drop(unsafe { reclaim(self.buf) });
            None
        }

        fn wait_timeout(self, timeout: Duration) -> Result<Option<Vec<u8>>, Elapsed> {
            let done = finish_by(self.request, Instant::now() + timeout);
            // SAFETY: the send completed, or was cancelled and then completed.
            drop(unsafe { reclaim(self.buf) });
            if done {
                Ok(None)
            } else {
                Err(Elapsed)
            }
        }
    }

    pub struct MpiRecvHandle {
        request: Request<'static, [u8], StaticScope>,
        buf: *mut [u8],
    }

    impl Wait for MpiRecvHandle {
        fn wait(self) -> Option<Vec<u8>> {
            self.request.wait();
            // SAFETY: the receive completed, nothing else references the buffer.
            Some(unsafe { reclaim(self.buf) })
        }

        fn wait_timeout(self, timeout: Duration) -> Result<Option<Vec<u8>>, Elapsed> {
            if finish_by(self.request, Instant::now() + timeout) {
                // SAFETY: the receive completed.
                Ok(Some(unsafe { reclaim(self.buf) }))
            } else {
                // SAFETY: the request was cancelled and completed.
                drop(unsafe { reclaim(self.buf) });
                Err(Elapsed)
            }
        }
    }

    /// Test `request` until it completes (`true`) or `deadline` passes, in
    /// which case it is cancelled and waited out (`false`).
    fn finish_by(mut request: Request<'static, [u8], StaticScope>, deadline: Instant) -> bool {
        loop {
            match request.test() {
                Ok(_) => return true,
                Err(pending) => request = pending,
            }
            if Instant::now() >= deadline {
                request.cancel();
                request.wait();
                return false;
            }
            std::thread::yield_now();
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiSendHandle;
        type RecvHandle = MpiRecvHandle;

        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiSendHandle {
            let data = leak(buf.to_vec());
            let ptr: *mut [u8] = data;
            // SAFETY: `ptr` stays valid until the handle reclaims it after completion.
            let msg: &'static [u8] = unsafe { &*ptr };
            let request = self
                .world
                .process_at_rank(peer as i32)
                .immediate_send_with_tag(StaticScope, msg, i32::from(tag));
            MpiSendHandle { request, buf: ptr }
        }

        fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> MpiRecvHandle {
            let data = leak(vec![0u8; buf.len()]);
            let ptr: *mut [u8] = data;
            // SAFETY: `ptr` stays valid until the handle reclaims it after completion.
            let target: &'static mut [u8] = unsafe { &mut *ptr };
            let request = self
                .world
                .process_at_rank(peer as i32)
                .immediate_receive_into_with_tag(StaticScope, target, i32::from(tag));
            MpiRecvHandle { request, buf: ptr }
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
