pub mod ticket_repository;
pub mod validation;
