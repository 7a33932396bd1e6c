// src/model/grouping.rs

//! Projects and labels group tasks for display. They never influence
//! scheduling.

use std::collections::BTreeSet;

use crate::types::{LabelId, ProjectId, StoreId, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    pub store_id: Option<StoreId>,
    pub name: String,
    /// Member tasks in display order.
    pub members: Vec<TaskId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub id: LabelId,
    pub store_id: Option<StoreId>,
    pub name: String,
    pub members: BTreeSet<TaskId>,
}
