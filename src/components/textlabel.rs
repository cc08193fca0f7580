use bevy_ecs::prelude::Component;

#[derive(Component, Clone, Debug, PartialEq)]
/// Floating text label drawn above a character.
///
/// Labels start hidden and are revealed one frame after their
/// [`BoneTracker`](super::bonetracker::BoneTracker) has produced a position.
pub struct TextLabel {
    /// The text content to render.
    pub content: String,
    /// Font size in stage units.
    pub font_size: f32,
    /// Whether the render adapter should draw the label.
    pub visible: bool,
}

impl TextLabel {
    /// Creates a new hidden label.
    pub fn new(content: impl Into<String>, font_size: f32) -> Self {
        Self {
            content: content.into(),
            font_size,
            visible: false,
        }
    }
    /// Updates the text content.
    pub fn set_content(&mut self, new_content: impl Into<String>) {
        self.content = new_content.into();
    }
}
