//! Undo records and the requests that replay them.
//!
//! Records are handed back to the caller when a mutation succeeds and are
//! never stored here. To reverse the mutation the caller sends the record
//! back verbatim; the engine recomputes every path from it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything needed to move a filed invoice back into the inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    /// Name the invoice had in the inbox.
    pub old_invoice_name: String,
    /// Name it was filed under (differs after a collision).
    pub new_invoice_name: String,
    /// Category folder, relative to the archive root (`A/Acme`).
    pub category_path: String,
    pub category_name: String,
    pub year: String,
}

/// A category folder created under a letter bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRecord {
    #[serde(rename = "directoryName", alias = "categoryName")]
    pub category_name: String,
    #[serde(rename = "letterFolder", alias = "letter")]
    pub letter: String,
}

/// A reversible mutation.
///
/// On the wire this is the `action` tag next to an `undoRecord` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "undoRecord", rename_all = "camelCase")]
pub enum UndoAction {
    Transfer(TransferRecord),
    CreateFolder(FolderRecord),
}

/// Request to reverse one earlier mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoRequest {
    /// Opaque caller identifier, echoed back untouched.
    #[serde(default)]
    pub action_id: Value,
    #[serde(flatten)]
    pub action: UndoAction,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transfer_request() {
        let request: UndoRequest = serde_json::from_value(json!({
            "action": "transfer",
            "actionId": "abc-123",
            "undoRecord": {
                "oldInvoiceName": "invoice1.pdf",
                "newInvoiceName": "invoice1 (2).pdf",
                "categoryPath": "A/Acme",
                "categoryName": "Acme",
                "year": "2024"
            }
        }))
        .unwrap();
        assert_eq!(request.action_id, json!("abc-123"));
        let UndoAction::Transfer(record) = request.action else {
            panic!("expected a transfer");
        };
        assert_eq!(record.new_invoice_name, "invoice1 (2).pdf");
        assert_eq!(record.category_path, "A/Acme");
    }

    #[test]
    fn test_folder_request_accepts_both_spellings() {
        let canonical: UndoRequest = serde_json::from_value(json!({
            "action": "createFolder",
            "actionId": 7,
            "undoRecord": {"directoryName": "Beta", "letterFolder": "B"}
        }))
        .unwrap();
        let short: UndoRequest = serde_json::from_value(json!({
            "action": "createFolder",
            "actionId": 7,
            "undoRecord": {"categoryName": "Beta", "letter": "B"}
        }))
        .unwrap();
        assert_eq!(canonical, short);
        assert_eq!(
            canonical.action,
            UndoAction::CreateFolder(FolderRecord {
                category_name: "Beta".to_string(),
                letter: "B".to_string(),
            })
        );
    }

    #[test]
    fn test_folder_record_serializes_canonically() {
        let record = FolderRecord {
            category_name: "Beta".to_string(),
            letter: "B".to_string(),
        };
        assert_eq!(serde_json::to_value(record).unwrap(), json!({"directoryName": "Beta", "letterFolder": "B"}));
    }

    #[test]
    fn test_unknown_action_rejected() {
        let result = serde_json::from_value::<UndoRequest>(json!({
            "action": "deleteEverything",
            "actionId": 1,
            "undoRecord": {}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_action_id_is_null() {
        let request: UndoRequest = serde_json::from_value(json!({
            "action": "createFolder",
            "undoRecord": {"directoryName": "Beta", "letterFolder": "B"}
        }))
        .unwrap();
        assert_eq!(request.action_id, Value::Null);
    }
}
