pub mod account;
pub mod email;
pub mod otp;
pub mod password;

pub use account::AccountService;
pub use email::{EmailMessage, HttpMailer, LogMailer, Mailer};
