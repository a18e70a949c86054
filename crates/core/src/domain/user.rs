use serde::{Deserialize, Serialize};

/// Shopper account, keyed by phone number. Passwords are stored and compared
/// as plaintext; anything stronger is out of scope for this system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub phone: String,
    pub password: String,
    pub name: String,
}

impl User {
    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password == candidate
    }
}
