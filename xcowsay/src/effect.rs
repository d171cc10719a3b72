use crate::core::CowState;

/// What happens to the popup's shapes when the timeline enters a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeEffect {
    ShowBubble,
    HideBubble,
    DestroyShapes,
}

impl ShapeEffect {
    pub fn on_enter(state: CowState) -> Option<Self> {
        match state {
            CowState::LeadIn => None,
            CowState::Display => Some(ShapeEffect::ShowBubble),
            CowState::LeadOut => Some(ShapeEffect::HideBubble),
            CowState::Cleanup => Some(ShapeEffect::DestroyShapes),
        }
    }
}
