/// Text Classification
pub mod text_classification;
