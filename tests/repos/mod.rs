mod application;
mod borrower;
mod prediction;
