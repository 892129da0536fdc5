//! Smartbar expand/collapse decision.

use crate::collaborators::{KeyboardSnapshot, SmartbarPreferences};

/// What the layout sees after a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LayoutInputs {
    pub(crate) has_candidates: bool,
    pub(crate) has_inline_suggestions: bool,
    pub(crate) is_selection_mode: bool,
}

/// Returns whether the shared actions row should be expanded, or `None` when
/// the layout must be left alone.
///
/// Decisions are suppressed while a repeatable key is held or the overflow
/// menu is open so the row does not flicker.
pub(crate) const fn shared_actions_expanded(
    smartbar: SmartbarPreferences,
    keyboard: &KeyboardSnapshot,
    inputs: LayoutInputs,
) -> Option<bool> {
    if !smartbar.enabled
        || !smartbar.shared_actions_auto_expand_collapse
        || keyboard.is_repeatable_key_down
        || keyboard.is_actions_overflow_visible
    {
        return None;
    }
    let nothing_to_show = !inputs.has_candidates && !inputs.has_inline_suggestions;
    Some(nothing_to_show || inputs.is_selection_mode)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const ON: SmartbarPreferences = SmartbarPreferences {
        enabled: true,
        shared_actions_auto_expand_collapse: true,
    };

    fn inputs(candidates: bool, inline: bool, selection: bool) -> LayoutInputs {
        LayoutInputs {
            has_candidates: candidates,
            has_inline_suggestions: inline,
            is_selection_mode: selection,
        }
    }

    #[rstest]
    #[case::empty(inputs(false, false, false), Some(true))]
    #[case::candidates(inputs(true, false, false), Some(false))]
    #[case::inline_only(inputs(false, true, false), Some(false))]
    #[case::selection(inputs(true, true, true), Some(true))]
    fn expands_when_nothing_to_show_or_selecting(
        #[case] inputs: LayoutInputs,
        #[case] expected: Option<bool>,
    ) {
        let keyboard = KeyboardSnapshot::default();
        assert_eq!(shared_actions_expanded(ON, &keyboard, inputs), expected);
    }

    #[rstest]
    #[case::repeatable_key(KeyboardSnapshot { is_repeatable_key_down: true, ..KeyboardSnapshot::default() }, ON)]
    #[case::overflow(KeyboardSnapshot { is_actions_overflow_visible: true, ..KeyboardSnapshot::default() }, ON)]
    #[case::smartbar_off(KeyboardSnapshot::default(), SmartbarPreferences { enabled: false, ..ON })]
    #[case::manual(KeyboardSnapshot::default(), SmartbarPreferences { shared_actions_auto_expand_collapse: false, ..ON })]
    fn leaves_layout_alone(
        #[case] keyboard: KeyboardSnapshot,
        #[case] smartbar: SmartbarPreferences,
    ) {
        assert_eq!(
            shared_actions_expanded(smartbar, &keyboard, inputs(false, false, false)),
            None
        );
    }
}
