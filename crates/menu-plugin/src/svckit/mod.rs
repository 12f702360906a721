//! Service Kit - Agent Tools
//!
//! Menu tools that implement `agent_core::Tool`.

mod item_price;
mod specials;

pub use item_price::ItemPriceTool;
pub use specials::SpecialsTool;
