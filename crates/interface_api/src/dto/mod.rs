//! Request/response data transfer objects

pub mod invoice;
pub mod series;
