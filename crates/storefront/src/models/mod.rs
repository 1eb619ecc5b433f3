//! Domain models for the storefront.

pub mod book;
pub mod cart;
pub mod flash;
pub mod order;
pub mod session;
pub mod user;

pub use book::{Author, Book, Category, Page, Publisher};
pub use cart::Cart;
pub use flash::{Flash, FlashLevel};
pub use order::{Order, OrderLine, OrderWithLines};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{Customer, ProfileUpdate};
