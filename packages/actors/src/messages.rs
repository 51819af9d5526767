//! Message types for actor communication.
//!
//! Workers never message each other; they coordinate only through the
//! store's claim protocol.

use ractor::RpcReplyPort;

/// Messages for the WorkerActor.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Run one loop iteration: check the stop signal, claim, execute, settle.
    Poll,
}

/// Messages for the PoolSupervisor.
#[derive(Debug)]
pub enum PoolMessage {
    /// Number of workers still running.
    LiveWorkers { reply: RpcReplyPort<usize> },
}
