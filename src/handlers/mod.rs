pub(crate) mod enhanced_football;
