pub mod layout;
pub mod pipeline;

#[cfg(test)]
pub mod test_support;
