//! Customer identity used to group orders.

use serde::Serialize;

use super::email::Email;
use super::id::UserId;

/// Key under which orders are grouped into a "customer".
///
/// An account reference is preferred; when an order was placed without an
/// account (guest checkout), the customer email stands in. The two are
/// never unified: an account-holding customer and a guest order with a
/// matching email count as distinct customers. That asymmetry is inherited
/// from how orders are recorded and is intentionally preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerKey {
    /// Orders tied to a registered account.
    Account(UserId),
    /// Guest orders, keyed by normalized email.
    Guest(Email),
}

impl CustomerKey {
    /// Derive the grouping key from an order's identity fields, preferring
    /// the account reference. Returns `None` when neither is present.
    #[must_use]
    pub fn from_parts(user_id: Option<UserId>, email: Option<&Email>) -> Option<Self> {
        match (user_id, email) {
            (Some(id), _) => Some(Self::Account(id)),
            (None, Some(email)) => Some(Self::Guest(email.clone())),
            (None, None) => None,
        }
    }
}

impl std::fmt::Display for CustomerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Account(id) => write!(f, "user:{id}"),
            Self::Guest(email) => write!(f, "guest:{email}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).expect("valid email")
    }

    #[test]
    fn test_account_preferred_over_email() {
        let key = CustomerKey::from_parts(Some(UserId::new(3)), Some(&email("a@b.com")));
        assert_eq!(key, Some(CustomerKey::Account(UserId::new(3))));
    }

    #[test]
    fn test_email_fallback() {
        let key = CustomerKey::from_parts(None, Some(&email("a@b.com")));
        assert_eq!(key, Some(CustomerKey::Guest(email("a@b.com"))));
    }

    #[test]
    fn test_no_identity() {
        assert_eq!(CustomerKey::from_parts(None, None), None);
    }

    #[test]
    fn test_account_and_guest_are_distinct() {
        // An account order and a guest order with the same email are two
        // different customers.
        let account = CustomerKey::from_parts(Some(UserId::new(3)), Some(&email("a@b.com")));
        let guest = CustomerKey::from_parts(None, Some(&email("a@b.com")));
        assert_ne!(account, guest);
    }

    #[test]
    fn test_display() {
        assert_eq!(CustomerKey::Account(UserId::new(9)).to_string(), "user:9");
        assert_eq!(
            CustomerKey::Guest(email("a@b.com")).to_string(),
            "guest:a@b.com"
        );
    }
}
