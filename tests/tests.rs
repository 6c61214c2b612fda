mod common;
mod repos;
