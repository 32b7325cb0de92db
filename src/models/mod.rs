pub mod identity;
pub mod registration;
pub mod token;

pub use identity::{Identity, Role};
pub use registration::Registration;
pub use token::{Credential, TokenGrant};
