//! **code-merger** - Collect text/code files, rename and reorder them, and merge
//! them into one output file through a merge backend.
//!
//! The heart of the crate is the file collection state manager in [`core`]:
//! tracked records, their merge order and the rename registry, kept
//! consistent through every add, rename, removal and reorder. The backend
//! that stores uploads and performs the byte-level merge sits behind
//! [`infra::client::MergeBackend`].

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// File collection state manager
pub mod core {
    /// Filename base/extension splitting
    pub mod names;

    /// Error taxonomy shared by every core operation
    pub mod error;
    pub use error::{CoreError, RejectReason, Result};

    /// Candidate acceptance (extension allow-list, size ceiling)
    pub mod validate;
    pub use validate::{Limits, Validator};

    /// Tracked records, merge order and change events
    pub mod collection;
    pub use collection::{
        Candidate, CollectionEvent, ContentHandle, FileCollection, FileId, FileRecord,
        RenameOutcome,
    };

    /// Original name -> display name bookkeeping
    pub mod rename;
    pub use rename::RenameRegistry;

    /// Reconciliation of observed (drag-and-drop) order
    pub mod reorder;
    pub use reorder::{Reconciliation, reconcile};

    /// Merge request payload
    pub mod merge;
    pub use merge::MergeRequest;

    /// Width-aware name shortening and size labels
    pub mod display;

    /// Clipped content previews
    pub mod preview;
    pub use preview::Preview;

    /// Collection wired to a merge backend
    pub mod session;
    pub use session::{AddReport, MergeOutput, MergeSession};
}

/// Infrastructure - configuration, backend client, file I/O and logging
pub mod infra {
    /// Layered configuration (file + CMERGE_ environment)
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Merge backend trait and HTTP implementation
    pub mod client;
    pub use client::{HttpBackend, MergeBackend};

    /// Candidate files from disk, content read on demand
    pub mod io;

    /// tracing subscriber setup
    pub mod logging;
}

/// Command handlers for the `cmerge` binary
pub mod cli_ext {
    pub mod check_cmd;
    pub mod merge_cmd;
    pub mod session_cmd;
    mod shared;
}

// Strategic re-exports for consumers of the library
pub use crate::cli::{AppContext, Cli, Commands};
pub use crate::core::{
    Candidate, CoreError, FileCollection, MergeRequest, MergeSession, RenameRegistry, Validator,
};
pub use crate::infra::{Config, HttpBackend, MergeBackend, load_config};
