//! Showcase site API: projects, client testimonials and captured leads

pub mod content;
pub mod error;
pub mod leads;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod upload;
pub mod validation;
