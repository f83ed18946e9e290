//! Conversions from external infrastructure errors into domain errors.

use banklink_domain::BankLinkError;
use keyring::Error as KeyringError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub BankLinkError);

impl From<InfraError> for BankLinkError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<BankLinkError> for InfraError {
    fn from(value: BankLinkError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoBankLinkError {
    fn into_banklink(self) -> BankLinkError;
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → BankLinkError */
/* -------------------------------------------------------------------------- */

impl IntoBankLinkError for KeyringError {
    fn into_banklink(self) -> BankLinkError {
        use KeyringError::*;

        let description = self.to_string();

        match self {
            NoEntry => BankLinkError::Storage("keychain entry not found".into()),
            BadEncoding(_) => {
                BankLinkError::Storage("credential in keychain is not valid UTF-8".into())
            }
            TooLong(name, limit) => BankLinkError::Storage(format!(
                "keychain attribute '{name}' exceeds platform limit ({limit})"
            )),
            Invalid(attr, reason) => {
                BankLinkError::Storage(format!("keychain attribute '{attr}' is invalid: {reason}"))
            }
            Ambiguous(entries) => BankLinkError::Storage(format!(
                "multiple keychain entries matched request ({} results)",
                entries.len()
            )),
            PlatformFailure(err) => BankLinkError::Storage(format!("keychain platform error: {err}")),
            NoStorageAccess(err) => {
                BankLinkError::Storage(format!("unable to access secure storage: {err}"))
            }
            _ => BankLinkError::Storage(description),
        }
    }
}

impl From<KeyringError> for InfraError {
    fn from(value: KeyringError) -> Self {
        InfraError(value.into_banklink())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → BankLinkError */
/* -------------------------------------------------------------------------- */

impl IntoBankLinkError for HttpError {
    fn into_banklink(self) -> BankLinkError {
        if self.is_timeout() {
            return BankLinkError::transport("HTTP request timed out");
        }

        if self.is_connect() {
            return BankLinkError::transport("HTTP connection failure");
        }

        if self.is_builder() {
            return BankLinkError::Config(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            return BankLinkError::remote(
                code,
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status")),
            );
        }

        if self.is_decode() {
            return BankLinkError::Decode(format!("failed to read HTTP body: {self}"));
        }

        BankLinkError::transport(format!("http error: {self}"))
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_banklink())
    }
}

/* -------------------------------------------------------------------------- */
/* rsa / serde_json / io → BankLinkError */
/* -------------------------------------------------------------------------- */

impl From<rsa::Error> for InfraError {
    fn from(value: rsa::Error) -> Self {
        InfraError(BankLinkError::Security(format!("rsa failure: {value}")))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(BankLinkError::Decode(value.to_string()))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(BankLinkError::Storage(format!("io failure: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
