//! Interactive layer: operator input, the terminal prompter and the menu loop.

pub mod input;
pub mod menu;
pub mod prompt;
pub mod terminal;
