pub mod city;

pub use city::{City, NearbyCity, NewCity};
