//! Ordered decision table mapping a conflict report to a resolution
//!
//! Rules are evaluated top to bottom and the first match wins. Error codes are
//! matched against their uppercase form; operations are namespaced as
//! `<namespace>.<action>` and matched exactly.

use fieldsync_domain::constants::{
    CHECKLIST_NOT_FOUND, INSPECTION_ITEM_CONFLICT, TICKET_VERSION_CONFLICT,
};
use fieldsync_domain::{ConflictResolution, ConflictResolutionResult, SyncConflict};

struct Facts<'a> {
    code: String,
    operation: &'a str,
}

impl Facts<'_> {
    fn code_has(&self, fragment: &str) -> bool {
        self.code.contains(fragment)
    }

    fn namespace_is(&self, namespace: &str) -> bool {
        self.operation.split_once('.').is_some_and(|(head, _)| head == namespace)
    }
}

struct Rule {
    matches: fn(&Facts<'_>) -> bool,
    resolution: ConflictResolution,
    reason: &'static str,
}

const RULES: &[Rule] = &[
    Rule {
        matches: |f| f.code_has("VERSION") || f.code == TICKET_VERSION_CONFLICT,
        resolution: ConflictResolution::ManualReview,
        reason: "Version mismatch: the server copy changed since this edit was made. \
                 Version conflicts are never merged automatically.",
    },
    Rule {
        matches: |f| f.code_has("NOT_FOUND") || f.code == CHECKLIST_NOT_FOUND,
        resolution: ConflictResolution::Dismiss,
        reason: "The target record no longer exists on the server.",
    },
    Rule {
        matches: |f| f.namespace_is("checklist_item"),
        resolution: ConflictResolution::Retry,
        reason: "Checklist items merge as last-writer-wins; safe to retry.",
    },
    Rule {
        matches: |f| f.namespace_is("time_event") && (f.code_has("ORDERING") || f.code_has("DUPLICATE")),
        resolution: ConflictResolution::ManualReview,
        reason: "Time event out of order or duplicated; a time exception must be created \
                 for a supervisor to resolve.",
    },
    Rule {
        matches: |f| f.namespace_is("time_event"),
        resolution: ConflictResolution::Retry,
        reason: "Time events are append-only; safe to retry.",
    },
    Rule {
        matches: |f| f.operation == "photo.upload",
        resolution: ConflictResolution::Retry,
        reason: "Photo uploads are resumable and the source file remains available locally; safe to retry.",
    },
    Rule {
        matches: |f| f.operation == "inspection_item.submit" && f.code == INSPECTION_ITEM_CONFLICT,
        resolution: ConflictResolution::ManualReview,
        reason: "Inspection item was submitted with a different result on the server.",
    },
    Rule {
        matches: |f| f.operation == "inspection_item.submit",
        resolution: ConflictResolution::Retry,
        reason: "Inspection item submission failed transiently; safe to retry.",
    },
    Rule {
        matches: |f| f.operation == "ticket.complete",
        resolution: ConflictResolution::ManualReview,
        reason: "Ticket completion conflicts with the server state and needs review.",
    },
    Rule {
        matches: |f| f.code_has("SERVER") || f.code_has("TIMEOUT") || f.code_has("NETWORK"),
        resolution: ConflictResolution::Retry,
        reason: "Transient server or network failure; safe to retry.",
    },
];

/// Assign a resolution to a conflict report.
///
/// Pure and deterministic: identical input always yields identical output.
/// `can_auto_resolve` is false exactly when the resolution is `ManualReview`.
pub fn classify(conflict: &SyncConflict) -> ConflictResolutionResult {
    let facts =
        Facts { code: conflict.error_code.to_ascii_uppercase(), operation: &conflict.operation };

    RULES
        .iter()
        .find(|rule| (rule.matches)(&facts))
        .map_or_else(
            || {
                ConflictResolutionResult::retry(format!(
                    "Unrecognized error code {}; retrying",
                    conflict.error_code
                ))
            },
            |rule| result_for(rule.resolution, rule.reason),
        )
}

fn result_for(resolution: ConflictResolution, reason: &str) -> ConflictResolutionResult {
    match resolution {
        ConflictResolution::Retry => ConflictResolutionResult::retry(reason),
        ConflictResolution::Dismiss => ConflictResolutionResult::dismiss(reason),
        ConflictResolution::ManualReview => ConflictResolutionResult::manual_review(reason),
    }
}
