//! Actor inventory

use serde::{Deserialize, Serialize};
use umbra_core::ItemSymbol;

/// A stack of identical items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub symbol: ItemSymbol,
    pub count: u32,
}

/// Items carried by an actor, in pickup order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    stacks: Vec<ItemStack>,
}

impl Inventory {
    /// Empty inventory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add items, merging into an existing stack
    pub fn add_item(&mut self, symbol: ItemSymbol, count: u32) {
        if count == 0 {
            return;
        }
        match self.stacks.iter_mut().find(|s| s.symbol == symbol) {
            Some(stack) => stack.count = stack.count.saturating_add(count),
            None => self.stacks.push(ItemStack { symbol, count }),
        }
    }

    /// Remove up to `count` items, returning how many were removed
    pub fn remove_item(&mut self, symbol: ItemSymbol, count: u32) -> u32 {
        let Some(index) = self.stacks.iter().position(|s| s.symbol == symbol) else {
            return 0;
        };
        let stack = &mut self.stacks[index];
        let removed = stack.count.min(count);
        stack.count -= removed;
        if stack.count == 0 {
            self.stacks.remove(index);
        }
        removed
    }

    /// Number of items of a kind
    pub fn count(&self, symbol: ItemSymbol) -> u32 {
        self.stacks
            .iter()
            .find(|s| s.symbol == symbol)
            .map(|s| s.count)
            .unwrap_or(0)
    }

    /// Whether at least one item of a kind is carried
    pub fn has_item(&self, symbol: ItemSymbol) -> bool {
        self.count(symbol) > 0
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.stacks.clear();
    }

    /// Number of distinct stacks
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    /// Nothing carried
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Stacks in pickup order
    pub fn iter(&self) -> impl Iterator<Item = &ItemStack> {
        self.stacks.iter()
    }
}
