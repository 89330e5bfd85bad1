//! Coxswain - a reconciliation core for declarative GitOps control-plane resources
//!
//! Coxswain manages remotely-stored declarative objects (projects,
//! repositories, repository credentials, certificates, GPG keys, accounts
//! and issued tokens) on behalf of a configuration-management caller: given
//! a desired description it creates, reads, updates or deletes the
//! corresponding remote object, while remaining safe under concurrent
//! invocations, tolerant of the one identifiable transient creation
//! failure, and non-destructive toward sub-fields owned by other actors.
//!
//! # Architecture
//!
//! The crate is a library boundary only; it defines no wire protocol and no
//! file format. It is organized in two layers:
//!
//! - [`remote`] - The consumed collaborator boundary: the [`remote::RemoteApi`]
//!   trait with per-class operations, typed request/state structs, and a
//!   deterministic mock implementation for tests
//! - [`sync`] - The reconciliation core: keyed read/write locking, the
//!   bounded retry executor, composite identity codecs, the observed-wins
//!   merge, and the per-class [`sync::Reconciler`] operations
//!
//! # Correctness Invariants
//!
//! Coxswain maintains the following invariants:
//!
//! 1. At most one in-flight mutating operation per (class, identity) pair;
//!    reads interleave with reads but never with a writer on the same key
//! 2. Project updates never remove remote-issued role tokens that are
//!    absent from the desired description, unless the role itself is removed
//! 3. A certificate create whose derived identity collides with an existing
//!    object fails with a terminal conflict before any remote create call,
//!    unless adopt mode is requested
//! 4. A project create targeting a name still draining from a previous
//!    delete waits out the remote-reported grace period before dispatching

pub mod remote;
pub mod sync;
