pub mod disposition;
pub mod embedding;
pub mod rank;
pub mod similarity;
