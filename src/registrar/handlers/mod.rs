//! Route handlers.
//!
//! Form handlers re-render their page with an error and a matching status code on
//! failure. Storage errors are logged and shown to the user as a generic message.

pub mod health;
pub mod home;
pub mod login;
pub mod logout;
pub mod register;
