pub mod filter;
pub mod layout;
pub mod search;
pub mod selection;
pub mod session;
pub mod trend;

#[cfg(test)]
mod layout_tests;
