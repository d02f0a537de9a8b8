//! Bearer-token authentication and principal resolution

mod resolver;
mod token;

pub use resolver::{IdentityResolver, ResolvedPrincipal, bearer_token};
pub use token::{Claims, TokenService};
