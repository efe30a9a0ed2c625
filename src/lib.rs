//! Library crate for star-quest-back: the player game-state engine of the star quest, exposed
//! for the server binary, the OpenAPI generator and integration tests.

pub mod config;
pub mod dao;
mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
