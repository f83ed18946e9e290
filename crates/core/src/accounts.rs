//! Extraction of typed models from tagged result objects

use banklink_domain::{
    AccountBalance, Amount, ApiUser, BankLinkError, MonetaryAccount, Result, TaggedObject,
};
use serde_json::Value;
use tracing::warn;

const USER_API_KEY_KIND: &str = "UserApiKey";

/// Parse a user listing entry.
///
/// OAuth grants list `UserApiKey` objects whose display name lives on the
/// granting user (`granted_by_user.<UserPerson|UserCompany>.display_name`);
/// direct user objects carry `display_name` themselves.
pub fn parse_user(item: &TaggedObject) -> Result<ApiUser> {
    let id = item
        .body
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| BankLinkError::Decode(format!("{} object has no numeric id", item.kind)))?;

    let display_name = if item.kind == USER_API_KEY_KIND {
        item.body
            .get("granted_by_user")
            .and_then(Value::as_object)
            .and_then(|granted| granted.values().next())
            .and_then(|user| user.get("display_name"))
            .and_then(Value::as_str)
    } else {
        item.body.get("display_name").and_then(Value::as_str)
    };

    Ok(ApiUser { id, kind: item.kind.clone(), display_name: display_name.map(str::to_string) })
}

/// Parse every user in a listing, failing on the first malformed entry.
pub fn parse_users(items: &[TaggedObject]) -> Result<Vec<ApiUser>> {
    items.iter().map(parse_user).collect()
}

/// Parse a single monetary account object.
pub fn parse_monetary_account(item: &TaggedObject) -> Result<MonetaryAccount> {
    let body = &item.body;
    let decode_error = |field: &str| BankLinkError::Decode(format!("{} is missing `{field}`", item.kind));

    let id = body.get("id").and_then(Value::as_u64).ok_or_else(|| decode_error("id"))?;
    let balance = body.get("balance").ok_or_else(|| decode_error("balance"))?;
    let value = balance
        .get("value")
        .and_then(Value::as_str)
        .ok_or_else(|| decode_error("balance.value"))?;
    let currency = balance
        .get("currency")
        .and_then(Value::as_str)
        .ok_or_else(|| decode_error("balance.currency"))?;

    Ok(MonetaryAccount {
        id,
        kind: item.kind.clone(),
        description: body.get("description").and_then(Value::as_str).unwrap_or_default().to_string(),
        balance: Amount { value: value.to_string(), currency: currency.to_string() },
        status: body.get("status").and_then(Value::as_str).map(str::to_string),
    })
}

/// Parse an account listing. Malformed entries are logged and skipped so one
/// odd account type does not hide the others.
pub fn parse_monetary_accounts(items: &[TaggedObject]) -> Vec<MonetaryAccount> {
    items
        .iter()
        .filter_map(|item| match parse_monetary_account(item) {
            Ok(account) => Some(account),
            Err(err) => {
                warn!(kind = %item.kind, error = %err, "skipping unparsable monetary account");
                None
            }
        })
        .collect()
}

/// Turn an account into the balance signal published to automations.
///
/// Returns `None` when the balance is not a decimal number.
pub fn balance_signal(
    user_id: u64,
    device_name: &str,
    account: &MonetaryAccount,
) -> Option<AccountBalance> {
    let value = account.balance.as_f64()?;
    Some(AccountBalance {
        key: format!("{user_id}-{}", account.id),
        label: format!("{device_name} - {} ({})", account.description, account.balance.currency),
        user_id,
        account_id: account.id,
        value,
        currency: account.balance.currency.clone(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn tagged(kind: &str, body: Value) -> TaggedObject {
        TaggedObject { kind: kind.to_string(), body }
    }

    #[test]
    fn parses_user_api_key_grants() {
        let item = tagged(
            "UserApiKey",
            json!({
                "id": 1234,
                "granted_by_user": {"UserPerson": {"id": 9, "display_name": "Jane Doe"}}
            }),
        );

        let user = parse_user(&item).unwrap();

        assert_eq!(user.id, 1234);
        assert_eq!(user.kind, "UserApiKey");
        assert_eq!(user.display_name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn parses_direct_user_objects() {
        let user =
            parse_user(&tagged("UserCompany", json!({"id": 5, "display_name": "Acme"}))).unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Acme"));
    }

    #[test]
    fn user_without_id_is_a_decode_error() {
        let result = parse_users(&[tagged("UserPerson", json!({"display_name": "x"}))]);
        assert!(matches!(result, Err(BankLinkError::Decode(_))));
    }

    #[test]
    fn parses_accounts_and_skips_malformed_ones() {
        let items = vec![
            tagged(
                "MonetaryAccountBank",
                json!({
                    "id": 11,
                    "description": "Main",
                    "status": "ACTIVE",
                    "balance": {"value": "120.50", "currency": "EUR"}
                }),
            ),
            tagged("MonetaryAccountSavings", json!({"id": 12, "description": "No balance"})),
        ];

        let accounts = parse_monetary_accounts(&items);

        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].id, 11);
        assert_eq!(accounts[0].kind, "MonetaryAccountBank");
        assert_eq!(accounts[0].balance.value, "120.50");
        assert_eq!(accounts[0].status.as_deref(), Some("ACTIVE"));
    }

    #[test]
    fn builds_balance_signal() {
        let account = MonetaryAccount {
            id: 11,
            kind: "MonetaryAccountBank".into(),
            description: "Main".into(),
            balance: Amount { value: "120.50".into(), currency: "EUR".into() },
            status: None,
        };

        let signal = balance_signal(42, "bunq", &account).unwrap();

        assert_eq!(signal.key, "42-11");
        assert_eq!(signal.label, "bunq - Main (EUR)");
        assert!((signal.value - 120.5).abs() < f64::EPSILON);
        assert_eq!(signal.currency, "EUR");
    }

    #[test]
    fn unparsable_balance_yields_no_signal() {
        let account = MonetaryAccount {
            id: 1,
            kind: "MonetaryAccountBank".into(),
            description: String::new(),
            balance: Amount { value: "abc".into(), currency: "EUR".into() },
            status: None,
        };
        assert!(balance_signal(1, "bunq", &account).is_none());
    }
}
