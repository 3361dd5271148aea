//! State carried between menu actions.

use crate::domain::model::Vec3;

/// Values remembered across actions within one interactive run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    last_offset: Option<Vec3>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently computed or entered offset.
    pub fn last_offset(&self) -> Option<Vec3> {
        self.last_offset
    }

    pub fn remember_offset(&mut self, offset: Vec3) {
        self.last_offset = Some(offset);
    }

    /// Forget every stored value.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
