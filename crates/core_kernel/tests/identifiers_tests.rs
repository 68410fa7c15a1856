//! Tests for the identifier newtypes

use core_kernel::{ClaimId, ClauseId, DiagnosisId, LineItemId, ProductId, ReceiptId};
use uuid::Uuid;

mod creation {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = ClaimId::new();
        let id2 = ClaimId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_new_v7_generates_time_ordered_ids() {
        let id1 = ClauseId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = ClauseId::new_v7();
        assert!(id1 < id2);
    }

    #[test]
    fn test_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = ProductId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }
}

mod display_and_parsing {
    use super::*;

    #[test]
    fn test_prefixes() {
        assert_eq!(ProductId::prefix(), "PRD");
        assert_eq!(ClauseId::prefix(), "CLS");
        assert_eq!(DiagnosisId::prefix(), "DGN");
        assert_eq!(ReceiptId::prefix(), "RCP");
        assert_eq!(ClaimId::prefix(), "CLM");
        assert_eq!(LineItemId::prefix(), "CLML");
    }

    #[test]
    fn test_parse_with_and_without_prefix() {
        let uuid = Uuid::new_v4();
        let with_prefix: ReceiptId = format!("RCP-{}", uuid).parse().unwrap();
        let bare: ReceiptId = uuid.to_string().parse().unwrap();
        assert_eq!(with_prefix, bare);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("CLM-not-a-uuid".parse::<ClaimId>().is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = DiagnosisId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }
}
