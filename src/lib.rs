//! # cdd-rs: Clock Decision Diagrams in Rust
//!
//! **`cdd-rs`** is a manager-centric library for **Clock Decision Diagrams (CDDs)**:
//! a shared, hash-consed representation of unions of *zones*, the convex sets of
//! clock valuations used by timed-automata verification.
//!
//! ## What is a CDD?
//!
//! A zone is a conjunction of constraints `x_i - x_j ⊲ c` over real-valued clocks,
//! where clock `x_0` is fixed at zero and `⊲` is `<` or `≤`. A union of zones
//! (a *federation*) is generally not convex, so it cannot be stored as a single
//! [difference-bound matrix][crate::dbm::Dbm].
//!
//! A CDD is a decision diagram whose nodes test one clock difference `x_i - x_j`
//! and split its real line into consecutive intervals, one child per interval.
//! Paths to `TRUE` are zones; the diagram is their union.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: All nodes live in a [`CddManager`][crate::manager::CddManager], which
//!   hash-conses them so that equal structures share one [`Ref`][crate::reference::Ref].
//! - **Handles and garbage collection**: [`Cdd`][crate::cdd::Cdd] handles keep their nodes alive; everything
//!   else is reclaimed when the node table fills up.
//! - **Memoized set algebra**: intersection, union, symmetric difference and complement, with an operation cache.
//! - **Reduction**: [`reduce`][crate::manager::CddManager::reduce] removes infeasible paths, so emptiness and
//!   equivalence checks are exact.
//! - **Matrix bridge**: conversion from and to difference-bound matrices, and exact zone containment.
//!
//! ## Basic Usage
//!
//! ```rust
//! use cdd_rs::bound::Bound;
//! use cdd_rs::cdd::Cdd;
//! use cdd_rs::dbm::Dbm;
//! use cdd_rs::manager::CddManager;
//!
//! // 1. Initialize the manager and declare clocks (x0 is the reference clock)
//! let manager = CddManager::new(3);
//! manager.add_clocks(3);
//!
//! // 2. Build a federation: 1 <= x1 <= 3  or  x2 - x1 > 4
//! let a = Cdd::interval(&manager, 1, 0, Bound::weak(1), Bound::weak(3));
//! let b = Cdd::lower(&manager, 2, 1, Bound::strict(4));
//! let f = (&a | &b).remove_negative().reduce();
//!
//! // 3. Check containment of a zone
//! let mut zone = Dbm::init(3);
//! zone.set(1, 0, Bound::weak(2));
//! zone.set(0, 1, Bound::weak(-2));
//! assert!(f.contains(&zone));
//!
//! // 4. Enumerate the zones
//! let mut rest = f.clone();
//! while let Some((zone, remainder)) = rest.extract(3) {
//!     assert!(f.contains(&zone));
//!     rest = remainder.reduce();
//! }
//! ```
//!
//! ## Core Components
//!
//! - **[`manager`]**: The [`CddManager`][crate::manager::CddManager] with node creation and garbage collection.
//! - **[`apply`]**, **[`reduce`]**, **[`bridge`]**: The algorithms, as methods on the manager.
//! - **[`cdd`]**: Reference-counted handles and operator overloading.
//! - **[`dbm`]**: A minimal difference-bound matrix.

pub mod apply;
pub mod bound;
pub mod bridge;
pub mod cache;
pub mod cdd;
pub mod count;
pub mod dbm;
pub mod manager;
pub mod node;
pub mod reduce;
pub mod reference;
pub mod table;
pub mod types;
pub mod utils;
