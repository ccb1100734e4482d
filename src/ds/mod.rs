//! Handle-addressed storage primitives shared by the eviction engines.
//!
//! The recency and frequency structures are ownership cycles when written
//! with pointers (map -> node -> neighbors -> map). Everything here stores
//! nodes in a slot arena instead and links them by [`arena::NodeId`], so
//! index maps hold plain handles and splices stay O(1).

pub mod arena;
pub mod key_list;
pub mod list;

pub(crate) use arena::{Arena, NodeId};
pub(crate) use key_list::KeyList;
pub(crate) use list::List;
