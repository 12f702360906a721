//! Specials Tool

use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool, ToolArguments, ToolSchema};
use async_trait::async_trait;

use crate::model::Menu;

/// Lists the day's specials
pub struct SpecialsTool {
    menu: Arc<Menu>,
}

impl SpecialsTool {
    pub const fn new(menu: Arc<Menu>) -> Self {
        Self { menu }
    }
}

#[async_trait]
impl Tool for SpecialsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_specials".into(),
            description: "Provides a list of specials from the menu.".into(),
            parameters: Vec::new(),
        }
    }

    async fn execute(&self, _arguments: &ToolArguments) -> CoreResult<String> {
        Ok(self.menu.specials_text())
    }
}
