pub mod enhanced_football;
