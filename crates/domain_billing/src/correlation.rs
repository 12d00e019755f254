//! Correlation text codec
//!
//! The payment provider echoes an invoice's free-text description back in its
//! webhook but has no structured field for our billing ids. The ids are
//! therefore written at the start of the description:
//!
//! ```text
//! 1372,67 (DocumentID: monthly-a, monthly-b)
//! 15 (DocumentID: N/A)
//! ```
//!
//! Only the leading id list is read back. The document ids are there for
//! humans reading the provider's dashboard.
//!
//! Services depend on [`CorrelationCodec`] rather than on this format so a
//! provider-side metadata field can replace it later.

use thiserror::Error;

use core_kernel::{BillingId, DocumentId};

/// Errors decoding correlation text
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CorrelationError {
    #[error("no billing ids found in correlation text")]
    Empty,

    #[error("invalid billing id token {token:?}")]
    InvalidToken { token: String },
}

/// Encodes billing ids into text the provider will echo back, and decodes them
pub trait CorrelationCodec: Send + Sync + 'static {
    /// Builds the correlation text for a set of billings
    fn encode(&self, ids: &[BillingId], documents: &[DocumentId]) -> String;

    /// Recovers the billing ids from correlation text
    ///
    /// Any malformed token rejects the whole text.
    fn decode(&self, text: &str) -> Result<Vec<BillingId>, CorrelationError>;
}

/// The description-field format used with hosted invoices
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptionCodec;

impl DescriptionCodec {
    const NO_DOCUMENTS: &'static str = "N/A";
}

impl CorrelationCodec for DescriptionCodec {
    fn encode(&self, ids: &[BillingId], documents: &[DocumentId]) -> String {
        let documents = if documents.is_empty() {
            Self::NO_DOCUMENTS.to_string()
        } else {
            documents
                .iter()
                .map(DocumentId::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };

        if ids.is_empty() {
            return format!("(DocumentID: {documents})");
        }

        let ids = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        format!("{ids} (DocumentID: {documents})")
    }

    fn decode(&self, text: &str) -> Result<Vec<BillingId>, CorrelationError> {
        let head = text.split_once(' ').map_or(text, |(head, _)| head);
        if head.is_empty() {
            return Err(CorrelationError::Empty);
        }

        head.split(',')
            .map(|token| {
                // Digits only: `str::parse` would also accept a leading '+'.
                Some(token)
                    .filter(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()))
                    .and_then(|t| t.parse::<u64>().ok())
                    .and_then(|value| i64::try_from(value).ok())
                    .map(BillingId::new)
                    .ok_or_else(|| CorrelationError::InvalidToken {
                        token: token.to_string(),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ignores_trailing_text() {
        let ids = DescriptionCodec.decode("9,10 (DocumentID: custom-x) paid via QRIS").unwrap();
        assert_eq!(ids, vec![BillingId::new(9), BillingId::new(10)]);
    }

    #[test]
    fn test_decode_rejects_empty_token() {
        let err = DescriptionCodec.decode("9,,10 (DocumentID: N/A)").unwrap_err();
        assert_eq!(err, CorrelationError::InvalidToken { token: String::new() });
    }

    #[test]
    fn test_decode_rejects_signed_numbers() {
        assert!(DescriptionCodec.decode("-4 (DocumentID: N/A)").is_err());
        assert!(DescriptionCodec.decode("+4 (DocumentID: N/A)").is_err());
    }
}
