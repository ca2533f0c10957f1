pub mod user;

pub use user::{AuthProvider, NewUser, OtpChallenge, User, UserRole};
