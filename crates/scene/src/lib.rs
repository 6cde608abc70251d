//! Scene Graph: hierarchical drawable nodes with parent-relative transforms.
//!
//! # Invariants
//! - The hierarchy is a tree; re-parenting a node under its own descendant is a
//!   programming error and panics.
//! - Every drawable resource has exactly one owner node. Replacing it is a single
//!   swap: the scene never observes zero or two resources on that node.
//! - World transforms are composed root-down on demand and never cached, so a
//!   transform written mid-frame is visible in that frame's draw list.
//! - Every structural mutation is recorded in the scene event log.

mod drawable;
mod geometry;
mod graph;

pub use drawable::{DrawableResource, Material, MaterialKind, ResourceId};
pub use geometry::{Geometry, GeometryError, GeometryParam, GeometrySpec, MAX_VERTICES};
pub use graph::{DrawItem, SceneError, SceneEvent, SceneGraph, SceneNode};
