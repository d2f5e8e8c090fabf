//! # Devicegraph
//!
//! The purpose of this module is to model a storage configuration as a graph
//! of devices and the relationships between them.
//!
//! In broad terms, this module is used as follows:
//!
//! 1. Create an empty `Devicegraph`, or take one from a storage session.
//! 2. Create disks with `Devicegraph::create_disk()` and build on top of them
//!    with the factory operations of the typed handles, e.g.
//!    `Disk::create_partition_table()`, `PartitionTable::create_partition()`
//!    and `Partition::create_filesystem()`.
//! 3. Query and mutate devices through their handles, passing the graph they
//!    live in.
//! 4. Optionally run `Devicegraph::check()` to find layouts that cannot exist
//!    on real hardware.
//!
//! Structural rules, such as a disk holding at most one partition table, are
//! enforced when devices are created. Rules about the contents of devices,
//! such as overlapping partitions, are only reported by the check pass.
//!
//! ## Layout
//!
//! ```text
//! storage_api/src/devicegraph
//! ├── cardinality.rs -------> # Helper describing valid holder counts.
//! ├── check.rs -------------> # Consistency check pass.
//! ├── conversions.rs -------> # Building a devicegraph from a layout.
//! ├── display.rs -----------> # Display implementations.
//! ├── graph.rs -------------> # Devicegraph & structural operations.
//! ├── handles --------------> # Typed device handles.
//! │   ├── mod.rs -----------> # DeviceHandle trait.
//! │   └── ... --------------> # One module per device kind.
//! ├── holders.rs -----------> # Relationship kinds.
//! ├── mod.rs ---------------> # This file.
//! ├── node.rs --------------> # DeviceNode & per-kind device data.
//! ├── types.rs -------------> # Storage ids & device kinds.
//! └── validation_tests.rs --> # Error path tests.
//! ```
//!

pub mod cardinality;
pub mod check;
pub(super) mod conversions;
pub mod graph;
pub mod handles;
pub mod holders;
pub(super) mod node;
pub mod types;

// Implementations of fmt::Display for the types in this module.
pub mod display;

pub use graph::Devicegraph;
