pub mod build;
pub mod check;
pub mod inspect;
pub mod new;
