//! # ember-cluster — address clustering for holding-requirement enforcement.
//!
//! An operator who routes rewards to a fresh wallet to dodge the holding
//! requirement is still linked to the owner address of every node they
//! run, and to every reward address they have ever used on any node.
//! Recording each observed `(owner, reward)` pair per node hash and
//! taking the transitive closure groups all of an operator's addresses
//! into one cluster; holdings are then evaluated at the cluster level.
//!
//! The closure is computed with a union-find structure, so chains of any
//! depth link fully. Recording and querying are separate types:
//! [`ClusterGraph`] only records, and [`ClusterGraph::finalize`] consumes
//! it into a [`ClusterSet`], the only type that answers queries. A
//! half-built closure is unrepresentable.

mod graph;
mod union_find;

pub use graph::{ClusterGraph, ClusterSet};
pub use union_find::UnionFind;
