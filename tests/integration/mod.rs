//! Integration tests for the Lorekeeper workspace.
//!
//! Each module covers one seam: path containment across the store API,
//! checkpoint/revert semantics on real git repositories, graph and link
//! analysis over documents on disk, sandbox boundaries, and the full
//! agent loop driven by a scripted model provider.

mod common;

mod agent_flow_test;
mod checkpoint_test;
mod graph_test;
mod sandbox_test;
mod store_security_test;
