//! Parsers for the text outputs of bioinformatics tools.
pub mod bcfstats;
