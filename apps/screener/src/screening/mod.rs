pub mod assembler;
pub mod engine;
pub mod handlers;
pub mod index;
pub mod intake;
pub mod pipeline;
pub mod prompts;
pub mod rules;
pub mod store;

#[cfg(test)]
pub mod test_support;
