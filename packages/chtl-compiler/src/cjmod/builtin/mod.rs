pub mod chtholly;
