pub mod city;
pub mod health;
