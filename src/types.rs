use chrono::NaiveDateTime;

pub type Id = i32;
pub type Time = NaiveDateTime;
