//! Item Price Tool

use std::sync::Arc;

use agent_core::{
    AgentError, ParameterSchema, Result as CoreResult, Tool, ToolArguments, ToolSchema,
};
use async_trait::async_trait;

use crate::model::Menu;

/// Looks up the price of a menu item
pub struct ItemPriceTool {
    menu: Arc<Menu>,
}

impl ItemPriceTool {
    pub const fn new(menu: Arc<Menu>) -> Self {
        Self { menu }
    }
}

#[async_trait]
impl Tool for ItemPriceTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_item_price".into(),
            description: "Provides the price of the requested menu item.".into(),
            parameters: vec![ParameterSchema::string(
                "menu_item",
                "The name of the menu item.",
            )],
        }
    }

    async fn execute(&self, arguments: &ToolArguments) -> CoreResult<String> {
        let item = arguments
            .get("menu_item")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AgentError::InvalidArguments {
                tool: "get_item_price".into(),
                reason: "menu_item must be a string".into(),
            })?;

        tracing::debug!(item, "Price lookup");
        Ok(self.menu.price_of(item).to_string())
    }
}
