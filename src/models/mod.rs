mod category;
mod pagination;
mod product;
mod response;
mod user;

pub use category::*;
pub use pagination::*;
pub use product::*;
pub use response::*;
pub use user::*;
