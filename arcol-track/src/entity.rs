// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Named places in the model hierarchy.

use std::fmt;
use std::rc::Rc;

use crate::{Id, NO_ID, Tracker};

const SEPARATOR: &str = "::";

/// A named part of a model, e.g. `top::node2::east_rx_stage`.
///
/// Components hold an `Rc<Entity>` and pass it to the logging macros.
pub struct Entity {
    /// Last component of the name.
    pub name: String,

    /// The enclosing entity. Only the top level has none.
    pub parent: Option<Rc<Entity>>,

    /// Id used in every report.
    pub id: Id,

    /// Where reports go.
    pub tracker: Tracker,

    full_name: String,
}

impl Entity {
    /// Create an entity called `name` inside `parent`.
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        let full_name = format!("{}{SEPARATOR}{name}", parent.full_name);
        Self::register(&parent.tracker, Some(parent.clone()), name, full_name)
    }

    fn register(tracker: &Tracker, parent: Option<Rc<Entity>>, name: &str, full_name: String) -> Self {
        let id = tracker.unique_id();
        let parent_id = parent.as_ref().map_or(NO_ID, |p| p.id);
        tracker.add_entity(id, parent_id, &full_name);
        Self {
            name: name.to_owned(),
            parent,
            id,
            tracker: tracker.clone(),
            full_name,
        }
    }

    /// The hierarchical name, from the top level down.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("full_name", &self.full_name)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// Create the top-level entity, the root of the hierarchy.
pub fn toplevel(tracker: &Tracker, name: &str) -> Rc<Entity> {
    Rc::new(Entity::register(tracker, None, name, name.to_owned()))
}
