#![allow(dead_code)]

pub mod wav;
