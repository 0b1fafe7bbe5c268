pub mod config;
pub mod outfits;
pub mod run;
pub mod serve;
pub mod startup;
