pub mod diversion;
