//! Role hierarchy resolution
//!
//! A role grants its own permission keys plus those of every ancestor
//! reachable through parent links. The data model does not forbid an
//! operator from wiring a parent cycle, so traversal carries a visited set
//! and each role contributes exactly once.

mod resolver;


pub use resolver::HierarchyResolver;
