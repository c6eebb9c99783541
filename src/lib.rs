pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod kmer;
pub mod links;
pub mod reconcile;
pub mod record;
pub mod state;
pub mod stopper;
pub mod store;

pub use self::config::{
    ColorSet, Combination, Direction, TraversalConfig, TraversalDirection,
};
pub use self::engine::{
    Contig, Cursor, EngineBuilder, Termination, TraversalEngine, Walk,
};
pub use self::error::{ConfigError, StoreError};
pub use self::graph::{Edge, Subgraph, Vertex};
pub use self::links::{LinkRecord, LinkSource, LinkStore, MemoryLinks};
pub use self::reconcile::{BubbleReconciler, Patch, Reconciliation};
pub use self::record::KmerRecord;
pub use self::state::TraversalState;
pub use self::stopper::{StoppingRule, StoppingRuleKind, Verdict};
pub use self::store::{KmerStore, MemoryStore, MmapStore};
