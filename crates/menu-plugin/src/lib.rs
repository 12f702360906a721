//! # menu-plugin
//!
//! Restaurant menu tools for the menu agent.
//!
//! | Tool             | Arguments           | Returns                 |
//! |------------------|---------------------|-------------------------|
//! | `get_specials`   | none                | the day's specials      |
//! | `get_item_price` | `menu_item: string` | the item's price        |

pub mod model;
pub mod svckit;

use std::sync::Arc;

use agent_core::{Result, ToolRegistry};

pub use model::{Course, Menu, Special};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{ItemPriceTool, SpecialsTool};
}

/// Name the menu agent is published under
pub const MENU_AGENT_NAME: &str = "MenuAgent";

/// Description shown to MCP clients
pub const MENU_AGENT_DESCRIPTION: &str =
    "Answers questions about the restaurant menu, its specials and prices.";

/// System prompt for the menu agent
pub const MENU_AGENT_INSTRUCTIONS: &str = "Answer questions about the menu.";

/// The menu plugin: both menu tools over one shared menu
#[derive(Clone, Debug, Default)]
pub struct MenuPlugin {
    menu: Arc<Menu>,
}

impl MenuPlugin {
    pub fn new(menu: Menu) -> Self {
        Self {
            menu: Arc::new(menu),
        }
    }

    /// Register every menu tool; fails if a name is already taken
    pub fn register_all(&self, registry: &mut ToolRegistry) -> Result<()> {
        registry.register(tools::SpecialsTool::new(self.menu.clone()))?;
        registry.register(tools::ItemPriceTool::new(self.menu.clone()))?;
        Ok(())
    }

    /// A fresh registry holding only the menu tools
    pub fn registry(&self) -> Result<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        self.register_all(&mut registry)?;
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{AgentError, ToolArguments};
    use serde_json::{Value, json};

    fn args(value: Value) -> ToolArguments {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_get_specials() {
        let registry = MenuPlugin::default().registry().unwrap();
        let out = registry.invoke("get_specials", &args(json!({}))).await.unwrap();
        assert_eq!(
            out,
            "Special Soup: Clam Chowder\nSpecial Salad: Cobb Salad\nSpecial Drink: Chai Tea"
        );
    }

    #[tokio::test]
    async fn test_get_item_price() {
        let registry = MenuPlugin::default().registry().unwrap();
        let out = registry
            .invoke("get_item_price", &args(json!({"menu_item": "Soup"})))
            .await
            .unwrap();
        assert_eq!(out, "$9.99");
    }

    #[tokio::test]
    async fn test_get_item_price_requires_item() {
        let registry = MenuPlugin::default().registry().unwrap();
        let err = registry
            .invoke("get_item_price", &args(json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn test_unregistered_name_fails() {
        let registry = MenuPlugin::default().registry().unwrap();
        for name in ["get_special", "GET_SPECIALS", "", "get_item_prices"] {
            let err = registry.invoke(name, &ToolArguments::new()).await.unwrap_err();
            assert!(matches!(err, AgentError::UnknownTool(_)));
        }
    }

    #[test]
    fn test_registering_twice_fails() {
        let plugin = MenuPlugin::default();
        let mut registry = plugin.registry().unwrap();
        assert!(matches!(
            plugin.register_all(&mut registry),
            Err(AgentError::DuplicateTool(_))
        ));
    }

    #[tokio::test]
    async fn test_custom_menu() {
        let menu = Menu::new(vec![Special::new(Course::Drink, "Lemonade")], "$4.50");
        let registry = MenuPlugin::new(menu).registry().unwrap();

        let specials = registry.invoke("get_specials", &ToolArguments::new()).await.unwrap();
        assert_eq!(specials, "Special Drink: Lemonade");
        let price = registry
            .invoke("get_item_price", &args(json!({"menu_item": "Lemonade"})))
            .await
            .unwrap();
        assert_eq!(price, "$4.50");
    }

    #[test]
    fn test_schemas_sorted() {
        let registry = MenuPlugin::default().registry().unwrap();
        let names: Vec<String> = registry.schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["get_item_price", "get_specials"]);
    }
}
