//! Per-item approval state.
//!
//! Transitions happen only on explicit calls. Nothing here reads
//! `rewrite_error`, and a later failed rewrite does not revoke an approval:
//! the item keeps its last successful `rewritten_html`.

use tracing::info;

use crate::item::ContentItem;

/// Approval operations over registry items.
pub struct ApprovalStateMachine;

impl ApprovalStateMachine {
    /// Set one item's approval unconditionally.
    pub fn toggle(item: &mut ContentItem, value: bool) {
        item.approved = value;
    }

    /// Approve every item that has a non-empty rewrite. Others are left as
    /// they are. Returns how many items changed state.
    pub fn approve_all_rewritten(items: &mut [ContentItem]) -> usize {
        let mut changed = 0;
        for item in items.iter_mut().filter(|item| item.has_rewrite()) {
            if !item.approved {
                item.approved = true;
                changed += 1;
            }
        }
        info!("Approved {changed} additional items with proposed HTML");
        changed
    }

    /// Unapprove every item. Returns how many items changed state.
    pub fn clear_all(items: &mut [ContentItem]) -> usize {
        let mut changed = 0;
        for item in items.iter_mut() {
            if item.approved {
                changed += 1;
            }
            item.approved = false;
        }
        info!("Cleared {changed} approvals");
        changed
    }

    /// Number of approved items.
    pub fn approved_count(items: &[ContentItem]) -> usize {
        items.iter().filter(|item| item.approved).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn items() -> Vec<ContentItem> {
        let mut rewritten = ContentItem::page("1", "a", "A", "<p>a</p>");
        rewritten.rewritten_html = "<p>A</p>".to_string();
        let pending = ContentItem::assignment("2", "B", "<p>b</p>");
        let empty = ContentItem::discussion("3", "C", "");
        vec![rewritten, pending, empty]
    }

    fn approvals(items: &[ContentItem]) -> Vec<bool> {
        items.iter().map(ContentItem::is_approved).collect()
    }

    #[test]
    fn test_toggle_is_unconditional() {
        let mut items = items();
        ApprovalStateMachine::toggle(&mut items[1], true);
        assert!(items[1].is_approved());
        assert!(!items[1].has_rewrite());

        ApprovalStateMachine::toggle(&mut items[1], false);
        assert!(!items[1].is_approved());
    }

    #[test]
    fn test_approve_all_only_touches_rewritten() {
        let mut items = items();
        let changed = ApprovalStateMachine::approve_all_rewritten(&mut items);

        assert_eq!(changed, 1);
        assert_eq!(approvals(&items), vec![true, false, false]);
    }

    #[test]
    fn test_approve_all_keeps_manual_approvals() {
        let mut items = items();
        ApprovalStateMachine::toggle(&mut items[2], true);
        ApprovalStateMachine::approve_all_rewritten(&mut items);

        assert_eq!(approvals(&items), vec![true, false, true]);
    }

    #[test]
    fn test_approve_all_is_idempotent() {
        let mut once = items();
        ApprovalStateMachine::approve_all_rewritten(&mut once);

        let mut twice = items();
        ApprovalStateMachine::approve_all_rewritten(&mut twice);
        let changed = ApprovalStateMachine::approve_all_rewritten(&mut twice);

        assert_eq!(changed, 0);
        assert_eq!(approvals(&once), approvals(&twice));
    }

    #[test]
    fn test_clear_all() {
        let mut items = items();
        ApprovalStateMachine::approve_all_rewritten(&mut items);
        ApprovalStateMachine::toggle(&mut items[1], true);

        assert_eq!(ApprovalStateMachine::approved_count(&items), 2);
        assert_eq!(ApprovalStateMachine::clear_all(&mut items), 2);
        assert_eq!(approvals(&items), vec![false, false, false]);
    }

    #[test]
    fn test_failed_rewrite_does_not_revoke() {
        let mut items = items();
        ApprovalStateMachine::approve_all_rewritten(&mut items);
        items[0].rewrite_error = Some("timeout".to_string());

        assert!(items[0].is_approved());
        assert!(items[0].is_ready_to_commit());
    }
}
