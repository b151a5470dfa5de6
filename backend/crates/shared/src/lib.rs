//! Shared Kernel
//!
//! The smallest vocabulary every other crate agrees on:
//! - [`error::kind::ErrorKind`] and [`error::app_error::AppError`], the
//!   transport-neutral error shape
//! - [`id::Id`], typed UUID identifiers
//!
//! Nothing here knows about accounts, sessions or tokens.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
